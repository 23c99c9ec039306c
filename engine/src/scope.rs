//! Generation-scoped access to a binding's result cell.
//!
//! Every identity change starts a new generation. Asynchronous work carries
//! a [`Ticket`] stamped with the generation it was issued under, and a
//! ticket only lands while its generation is still current. This is what
//! keeps a slow response for an old target from overwriting a newer one.

use crate::{
    error::Result,
    state::{ResultCell, ResultState, View},
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Notified after an outcome lands in the cell.
pub(crate) type Listener = Rc<dyn Fn()>;

struct Slot<T> {
    cell: ResultCell<T>,
    generation: u64,
    disposed: bool,
    /// Set while the owner is inside `observe`.
    observing: bool,
    listener: Option<Listener>,
}

/// Owner side: resets the cell and mints tickets.
pub(crate) struct Scope<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Scope<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                cell: ResultCell::new(),
                generation: 0,
                disposed: false,
                observing: false,
                listener: None,
            })),
        }
    }

    pub(crate) fn set_listener(&self, listener: Listener) {
        self.slot.borrow_mut().listener = Some(listener);
    }

    /// Start a new generation: reset the cell and return its ticket.
    ///
    /// Tickets from earlier generations go stale immediately.
    pub(crate) fn rebind(&self) -> Ticket<T> {
        let mut slot = self.slot.borrow_mut();
        slot.generation += 1;
        slot.cell.reset();
        Ticket {
            slot: Rc::downgrade(&self.slot),
            generation: slot.generation,
        }
    }

    /// Run `f` with listener notification suppressed.
    ///
    /// Outcomes a source delivers synchronously from inside `f` still land
    /// in the cell; the caller reads them from the view `observe` returns.
    /// The host usually holds the binding mutably at this point, so calling
    /// back into it would re-enter.
    pub(crate) fn observing<R>(&self, f: impl FnOnce() -> R) -> R {
        self.slot.borrow_mut().observing = true;
        let out = f();
        self.slot.borrow_mut().observing = false;
        out
    }

    /// Invalidate every ticket and refuse all further outcomes.
    pub(crate) fn retire(&self) {
        let mut slot = self.slot.borrow_mut();
        slot.generation += 1;
        slot.disposed = true;
        slot.cell.reset();
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.slot.borrow().disposed
    }

    pub(crate) fn generation(&self) -> u64 {
        self.slot.borrow().generation
    }

    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&ResultState<T>) -> R) -> R {
        f(self.slot.borrow().cell.read())
    }
}

impl<T: Clone> Scope<T> {
    pub(crate) fn state(&self) -> ResultState<T> {
        self.inspect(ResultState::clone)
    }

    pub(crate) fn view(&self, enabled: bool) -> View<T> {
        self.inspect(|state| state.view(enabled))
    }
}

/// Capability to settle the cell for one generation.
pub(crate) struct Ticket<T> {
    slot: Weak<RefCell<Slot<T>>>,
    generation: u64,
}

impl<T> Ticket<T> {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn is_current(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| {
            let slot = slot.borrow();
            !slot.disposed && slot.generation == self.generation
        })
    }

    /// Apply `outcome` if this ticket is still current.
    ///
    /// A failure is terminal for its generation: later outcomes on the
    /// same generation are dropped. Returns whether the cell changed.
    pub(crate) fn settle(&self, outcome: Result<T>) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            tracing::trace!(generation = self.generation, "binding dropped, discarding result");
            return false;
        };

        let listener = {
            let mut slot = slot.borrow_mut();
            if slot.disposed || slot.generation != self.generation {
                tracing::trace!(
                    issued = self.generation,
                    current = slot.generation,
                    "discarding stale result"
                );
                return false;
            }
            if slot.cell.read().is_failed() {
                tracing::trace!(generation = self.generation, "ignoring delivery after failure");
                return false;
            }

            match outcome {
                Ok(value) => slot.cell.set_value(value),
                Err(err) => slot.cell.set_error(err),
            }
            if slot.observing {
                tracing::trace!(generation = self.generation, "settled during observe, listener skipped");
                None
            } else {
                slot.listener.clone()
            }
        };

        if let Some(listener) = listener {
            listener();
        }
        true
    }
}

impl<T> Clone for Ticket<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Weak::clone(&self.slot),
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    #[test]
    fn current_ticket_settles() {
        let scope = Scope::new();
        let ticket = scope.rebind();

        assert!(ticket.is_current());
        assert!(ticket.settle(Ok(5)));
        assert_eq!(scope.state(), ResultState::Value(5));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let scope = Scope::new();
        let old = scope.rebind();
        let new = scope.rebind();

        assert!(!old.is_current());
        assert!(!old.settle(Ok("old")));
        assert!(scope.state().is_unresolved());

        assert!(new.settle(Ok("new")));
        assert!(!old.settle(Ok("old")));
        assert_eq!(scope.state(), ResultState::Value("new"));
    }

    #[test]
    fn rebind_resets_cell() {
        let scope = Scope::new();
        scope.rebind().settle(Ok(1));
        let before = scope.generation();

        scope.rebind();
        assert!(scope.state().is_unresolved());
        assert_eq!(scope.generation(), before + 1);
    }

    #[test]
    fn failure_is_terminal_for_generation() {
        let scope = Scope::new();
        let ticket = scope.rebind();

        assert!(ticket.settle(Err(Error::PermissionDenied("books".into()))));
        assert!(!ticket.settle(Ok(vec![1, 2])));
        assert!(scope.state().is_failed());

        let next = scope.rebind();
        assert!(next.settle(Ok(vec![3])));
        assert_eq!(scope.state(), ResultState::Value(vec![3]));
    }

    #[test]
    fn retire_blocks_everything() {
        let scope = Scope::new();
        let ticket = scope.rebind();
        scope.retire();

        assert!(scope.is_disposed());
        assert!(!ticket.settle(Ok(1)));
        assert!(scope.state().is_unresolved());
    }

    #[test]
    fn dropped_scope_discards() {
        let scope = Scope::new();
        let ticket = scope.rebind();
        drop(scope);
        assert!(!ticket.is_current());
        assert!(!ticket.settle(Ok(1)));
    }

    #[test]
    fn listener_fires_only_on_applied_outcomes() {
        let scope = Scope::new();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        scope.set_listener(Rc::new(move || counter.set(counter.get() + 1)));

        let stale = scope.rebind();
        let current = scope.rebind();
        stale.settle(Ok(1));
        assert_eq!(fired.get(), 0);

        current.settle(Ok(2));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn listener_skipped_while_observing() {
        let scope = Scope::new();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        scope.set_listener(Rc::new(move || counter.set(counter.get() + 1)));

        let applied = scope.observing(|| scope.rebind().settle(Ok(1)));
        assert!(applied);
        assert_eq!(scope.state(), ResultState::Value(1));
        assert_eq!(fired.get(), 0);

        // Later deliveries notify again
        let ticket = scope.rebind();
        ticket.settle(Ok(2));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn listener_may_read_scope() {
        let scope = Rc::new(Scope::new());
        let seen = Rc::new(Cell::new(0));
        let (reader, sink) = (Rc::clone(&scope), Rc::clone(&seen));
        scope.set_listener(Rc::new(move || {
            if let ResultState::Value(v) = reader.state() {
                sink.set(v);
            }
        }));

        scope.rebind().settle(Ok(9));
        assert_eq!(seen.get(), 9);
    }
}
