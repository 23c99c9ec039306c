//! Live collection binding.
//!
//! [`LiveCollectionBinding`] keeps one subscription open for the current
//! identity and mirrors every snapshot the source pushes. Identity changes
//! cancel the old subscription before the new one is opened, and anything
//! the old subscription still delivers is dropped by generation check.

use crate::{
    collaborator::{CancelHandle, DocumentSource},
    effect::{Cleanup, Effect},
    identity::{IdentityKey, NOOP_KEY},
    scope::Scope,
    state::{ResultState, View},
    target::Target,
    Error,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Where a live binding stands for its current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No subscription: no target, an undecided target, or disposed.
    Idle,
    /// Subscription open, first snapshot not yet delivered.
    Subscribing,
    /// At least one snapshot delivered.
    Synced,
    /// The subscription reported an error; it is not reopened.
    Failed,
}

/// Owner of the single active subscription handle.
#[derive(Debug, Default)]
pub struct Multiplexer {
    active: Option<(IdentityKey, CancelHandle)>,
    opened: u64,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a freshly opened handle.
    ///
    /// A handle still installed at this point is cancelled first, so two
    /// subscriptions never overlap.
    pub fn install(&mut self, key: IdentityKey, handle: CancelHandle) {
        if self.release() {
            tracing::warn!(key = %key, "replaced a subscription that was never released");
        }
        tracing::debug!(key = %key, "subscription opened");
        self.active = Some((key, handle));
        self.opened += 1;
    }

    /// Cancel the active handle, if any. Returns whether one was live.
    pub fn release(&mut self) -> bool {
        match self.active.take() {
            Some((key, mut handle)) => {
                handle.cancel();
                tracing::debug!(key = %key, "subscription cancelled");
                true
            }
            None => false,
        }
    }

    pub fn active_key(&self) -> Option<&IdentityKey> {
        self.active.as_ref().map(|(key, _)| key)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Total number of subscriptions installed over the lifetime.
    pub fn opened(&self) -> u64 {
        self.opened
    }
}

/// Binds a live, ordered sequence of documents to host state.
///
/// Every snapshot replaces the whole sequence. An empty snapshot is a
/// value (`Some(vec![])`), not loading.
pub struct LiveCollectionBinding<S: DocumentSource> {
    source: S,
    scope: Scope<Vec<S::Doc>>,
    effect: Effect<IdentityKey>,
    mux: Rc<RefCell<Multiplexer>>,
}

impl<S: DocumentSource> LiveCollectionBinding<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            scope: Scope::new(),
            effect: Effect::new(),
            mux: Rc::new(RefCell::new(Multiplexer::new())),
        }
    }

    /// Call `listener` whenever a snapshot or error lands.
    pub fn with_listener(self, listener: impl Fn() + 'static) -> Self {
        self.scope.set_listener(Rc::new(listener));
        self
    }

    pub fn set_listener(&mut self, listener: impl Fn() + 'static) {
        self.scope.set_listener(Rc::new(listener));
    }

    /// Evaluate the binding for this render.
    ///
    /// On an identity change the previous subscription is cancelled, the
    /// view resets to loading, and (unless the target is absent or
    /// undecided) exactly one new subscription is opened.
    pub fn observe(&mut self, target: Option<&Target>) -> View<Vec<S::Doc>> {
        if self.scope.is_disposed() {
            return View::idle();
        }

        let key = IdentityKey::derive(target);
        let (source, scope, mux, effect) = (&self.source, &self.scope, &self.mux, &mut self.effect);
        scope.observing(|| {
            effect.watch(key, |key| {
                let ticket = scope.rebind();
                tracing::debug!(key = %key, generation = ticket.generation(), "live identity changed");

                let target = target?;
                let selector = target.selector()?;

                let on_snapshot = {
                    let ticket = ticket.clone();
                    Box::new(move |docs: Vec<S::Doc>| {
                        ticket.settle(Ok(docs));
                    })
                };
                let on_error = Box::new(move |err: Error| {
                    tracing::debug!(error = %err, "subscription failed");
                    ticket.settle(Err(err));
                });

                let handle = source.subscribe(target.collection(), &selector, on_snapshot, on_error);
                mux.borrow_mut().install(key.clone(), handle);

                let mux = Rc::clone(mux);
                let cleanup: Cleanup = Box::new(move || {
                    mux.borrow_mut().release();
                });
                Some(cleanup)
            })
        });

        self.view()
    }

    /// The current view, without re-evaluating any target.
    pub fn view(&self) -> View<Vec<S::Doc>> {
        if self.scope.is_disposed() {
            return View::idle();
        }
        self.scope.view(!self.key().is_noop())
    }

    pub fn state(&self) -> ResultState<Vec<S::Doc>> {
        self.scope.state()
    }

    pub fn phase(&self) -> Phase {
        if self.scope.is_disposed() || self.key().is_noop() {
            return Phase::Idle;
        }
        self.scope.inspect(|state| match state {
            ResultState::Unresolved => Phase::Subscribing,
            ResultState::Value(_) => Phase::Synced,
            ResultState::Failed(_) => Phase::Failed,
        })
    }

    /// Identity of the last observed target.
    pub fn key(&self) -> &IdentityKey {
        self.effect.key().unwrap_or(&NOOP_KEY)
    }

    /// Whether a subscription handle is currently held.
    pub fn is_subscribed(&self) -> bool {
        self.mux.borrow().is_active()
    }

    /// Number of subscriptions opened so far.
    pub fn subscriptions_opened(&self) -> u64 {
        self.mux.borrow().opened()
    }

    /// Cancel the subscription and stop for good.
    pub fn dispose(&mut self) {
        if self.scope.is_disposed() {
            return;
        }
        self.effect.dispose();
        self.mux.borrow_mut().release();
        self.scope.retire();
        tracing::debug!(key = %self.key(), "live binding disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }
}

impl<S: DocumentSource> Drop for LiveCollectionBinding<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: DocumentSource> std::fmt::Debug for LiveCollectionBinding<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCollectionBinding")
            .field("key", self.key())
            .field("phase", &self.phase())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
