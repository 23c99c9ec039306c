//! The document source a binding reads from.
//!
//! Sources deliver results through callbacks so the engine stays free of
//! any async runtime. A source may call back synchronously from inside the
//! request or later from its own event loop; bindings handle both.

use crate::{error::Result, query::Query, target::Selector, Error};
use std::rc::Rc;
use std::sync::Arc;

/// Completion of a point read. `Ok(None)` means the document does not exist.
pub type FetchCallback<D> = Box<dyn FnOnce(Result<Option<D>>)>;

/// Completion of a one-shot query.
pub type QueryCallback<D> = Box<dyn FnOnce(Result<Vec<D>>)>;

/// Receives every complete snapshot of a subscription.
pub type SnapshotCallback<D> = Box<dyn FnMut(Vec<D>)>;

/// Receives errors pushed by a subscription.
pub type ErrorCallback = Box<dyn FnMut(Error)>;

/// A store supporting point reads, one-shot queries and live subscriptions.
pub trait DocumentSource {
    /// Record type delivered to bindings.
    type Doc: Clone + 'static;

    /// Read one document.
    fn fetch_one(&self, collection: &str, id: &str, on_done: FetchCallback<Self::Doc>);

    /// Run a query once.
    fn fetch_query(&self, collection: &str, query: &Query, on_done: QueryCallback<Self::Doc>);

    /// Open a live subscription.
    ///
    /// Each snapshot is the full current result, not a delta. Cancelling the
    /// returned handle stops further deliveries.
    fn subscribe(
        &self,
        collection: &str,
        selector: &Selector,
        on_snapshot: SnapshotCallback<Self::Doc>,
        on_error: ErrorCallback,
    ) -> CancelHandle;
}

macro_rules! forward_source {
    ($($ptr:ty),*) => {$(
        impl<S: DocumentSource + ?Sized> DocumentSource for $ptr {
            type Doc = S::Doc;

            fn fetch_one(&self, collection: &str, id: &str, on_done: FetchCallback<Self::Doc>) {
                (**self).fetch_one(collection, id, on_done)
            }

            fn fetch_query(&self, collection: &str, query: &Query, on_done: QueryCallback<Self::Doc>) {
                (**self).fetch_query(collection, query, on_done)
            }

            fn subscribe(
                &self,
                collection: &str,
                selector: &Selector,
                on_snapshot: SnapshotCallback<Self::Doc>,
                on_error: ErrorCallback,
            ) -> CancelHandle {
                (**self).subscribe(collection, selector, on_snapshot, on_error)
            }
        }
    )*};
}

forward_source!(Rc<S>, Arc<S>, &S);

/// Owned handle to a live subscription.
///
/// Cancelling is idempotent. Dropping a handle cancels it.
pub struct CancelHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl CancelHandle {
    /// Wrap the function that tears the subscription down.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancel the subscription. Returns false if it was already cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_live(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("live", &self.is_live())
            .finish()
    }
}
