//! Three-state result cell and the view derived from it.

use crate::Error;

/// Outcome held by a binding for its current identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultState<T> {
    /// No data yet, and no error.
    #[default]
    Unresolved,
    Value(T),
    Failed(Error),
}

impl<T> ResultState<T> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResultState::Unresolved)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResultState::Failed(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ResultState::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            ResultState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T: Clone> ResultState<T> {
    /// Derive the view a host renders from.
    ///
    /// `enabled` is false for the no-op identity, which never loads.
    pub fn view(&self, enabled: bool) -> View<T> {
        View {
            data: self.value().cloned(),
            loading: enabled && self.is_unresolved(),
            error: self.error().cloned(),
        }
    }
}

/// What a host sees on each render.
///
/// Recomputed from [`ResultState`] on every observation, so `loading`
/// can never disagree with `data` and `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<Error>,
}

impl<T> View<T> {
    /// The view of a binding with nothing to do.
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// True once data or an error has arrived.
    pub fn is_settled(&self) -> bool {
        self.data.is_some() || self.error.is_some()
    }
}

/// Holder of a [`ResultState`].
///
/// The cell does not know about identities; owners discard stale
/// outcomes before they reach it.
#[derive(Debug, Default)]
pub struct ResultCell<T> {
    state: ResultState<T>,
}

impl<T> ResultCell<T> {
    pub fn new() -> Self {
        Self {
            state: ResultState::Unresolved,
        }
    }

    pub fn read(&self) -> &ResultState<T> {
        &self.state
    }

    pub fn set_value(&mut self, value: T) {
        self.state = ResultState::Value(value);
    }

    pub fn set_error(&mut self, err: Error) {
        self.state = ResultState::Failed(err);
    }

    /// Return to `Unresolved`.
    pub fn reset(&mut self) {
        self.state = ResultState::Unresolved;
    }
}
