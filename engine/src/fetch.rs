//! Single-record binding.
//!
//! [`SingleFetchBinding`] resolves a target to at most one document, once
//! per identity. Re-observing the same identity is free; a new identity
//! resets the view to loading before the new read is issued.

use crate::{
    collaborator::DocumentSource,
    effect::Effect,
    identity::{IdentityKey, NOOP_KEY},
    scope::{Scope, Ticket},
    state::{ResultState, View},
    target::{Selector, Target},
};
use std::rc::Rc;

/// Binds one document (or the first match of a query) to host state.
///
/// The value is `Option<Doc>`: `Some(None)` in [`View::data`] means the
/// read succeeded and the document does not exist.
pub struct SingleFetchBinding<S: DocumentSource> {
    source: S,
    scope: Scope<Option<S::Doc>>,
    effect: Effect<IdentityKey>,
}

impl<S: DocumentSource> SingleFetchBinding<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            scope: Scope::new(),
            effect: Effect::new(),
        }
    }

    /// Call `listener` whenever a result lands, so the host can re-render.
    pub fn with_listener(self, listener: impl Fn() + 'static) -> Self {
        self.scope.set_listener(Rc::new(listener));
        self
    }

    pub fn set_listener(&mut self, listener: impl Fn() + 'static) {
        self.scope.set_listener(Rc::new(listener));
    }

    /// Evaluate the binding for this render.
    ///
    /// When the identity of `target` differs from the previous call the
    /// view is reset to loading and one read is issued. Otherwise nothing
    /// happens and the current view is returned.
    pub fn observe(&mut self, target: Option<&Target>) -> View<Option<S::Doc>> {
        if self.scope.is_disposed() {
            return View::idle();
        }

        let key = IdentityKey::derive(target);
        let (source, scope, effect) = (&self.source, &self.scope, &mut self.effect);
        scope.observing(|| {
            effect.watch(key, |key| {
                let ticket = scope.rebind();
                tracing::debug!(key = %key, generation = ticket.generation(), "fetch identity changed");

                let target = target?;
                let selector = target.selector()?;
                issue(source, target.collection(), selector, ticket);
                None
            })
        });

        self.view()
    }

    /// The current view, without re-evaluating any target.
    pub fn view(&self) -> View<Option<S::Doc>> {
        if self.scope.is_disposed() {
            return View::idle();
        }
        self.scope.view(!self.key().is_noop())
    }

    pub fn state(&self) -> ResultState<Option<S::Doc>> {
        self.scope.state()
    }

    /// Identity of the last observed target.
    pub fn key(&self) -> &IdentityKey {
        self.effect.key().unwrap_or(&NOOP_KEY)
    }

    /// Number of identity changes seen so far, including the first render.
    pub fn identity_changes(&self) -> u64 {
        self.effect.runs()
    }

    /// Stop for good. Results still in flight are discarded.
    pub fn dispose(&mut self) {
        if self.scope.is_disposed() {
            return;
        }
        self.effect.dispose();
        self.scope.retire();
        tracing::debug!(key = %self.key(), "fetch binding disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }
}

fn issue<S: DocumentSource>(
    source: &S,
    collection: &str,
    selector: Selector,
    ticket: Ticket<Option<S::Doc>>,
) {
    match selector {
        Selector::Document(id) => source.fetch_one(
            collection,
            &id,
            Box::new(move |outcome| {
                ticket.settle(outcome);
            }),
        ),
        Selector::Query(query) => source.fetch_query(
            collection,
            &query,
            Box::new(move |outcome| {
                ticket.settle(outcome.map(|docs| docs.into_iter().next()));
            }),
        ),
    }
}

impl<S: DocumentSource> Drop for SingleFetchBinding<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: DocumentSource> std::fmt::Debug for SingleFetchBinding<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFetchBinding")
            .field("key", self.key())
            .field("generation", &self.scope.generation())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
