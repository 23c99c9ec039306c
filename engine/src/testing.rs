//! Hand-driven document source for unit tests.

use crate::collaborator::{
    CancelHandle, DocumentSource, ErrorCallback, FetchCallback, QueryCallback, SnapshotCallback,
};
use crate::{error::Result, query::Query, target::Selector, Error};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub(crate) struct Subscription {
    pub collection: String,
    pub selector: Selector,
    on_snapshot: Option<SnapshotCallback<String>>,
    on_error: Option<ErrorCallback>,
    pub cancelled: Rc<Cell<bool>>,
}

/// Records every request and lets the test decide when and how it completes.
#[derive(Default)]
pub(crate) struct ManualSource {
    pub fetches: RefCell<Vec<(String, String, Option<FetchCallback<String>>)>>,
    pub queries: RefCell<Vec<(String, Query, Option<QueryCallback<String>>)>>,
    pub subscriptions: RefCell<Vec<Subscription>>,
}

impl ManualSource {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }

    pub fn resolve_fetch(&self, index: usize, outcome: Result<Option<String>>) {
        let callback = self.fetches.borrow_mut()[index].2.take();
        if let Some(callback) = callback {
            callback(outcome);
        }
    }

    pub fn resolve_query(&self, index: usize, outcome: Result<Vec<String>>) {
        let callback = self.queries.borrow_mut()[index].2.take();
        if let Some(callback) = callback {
            callback(outcome);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.subscriptions.borrow()[index].cancelled.get()
    }

    /// Deliver a snapshot even if the subscription was cancelled, the way a
    /// late message already in flight would.
    pub fn push(&self, index: usize, docs: Vec<String>) {
        let callback = self.subscriptions.borrow_mut()[index].on_snapshot.take();
        if let Some(mut callback) = callback {
            callback(docs);
            self.subscriptions.borrow_mut()[index].on_snapshot = Some(callback);
        }
    }

    pub fn fail(&self, index: usize, err: Error) {
        let callback = self.subscriptions.borrow_mut()[index].on_error.take();
        if let Some(mut callback) = callback {
            callback(err);
            self.subscriptions.borrow_mut()[index].on_error = Some(callback);
        }
    }
}

impl DocumentSource for ManualSource {
    type Doc = String;

    fn fetch_one(&self, collection: &str, id: &str, on_done: FetchCallback<String>) {
        self.fetches
            .borrow_mut()
            .push((collection.to_string(), id.to_string(), Some(on_done)));
    }

    fn fetch_query(&self, collection: &str, query: &Query, on_done: QueryCallback<String>) {
        self.queries
            .borrow_mut()
            .push((collection.to_string(), query.clone(), Some(on_done)));
    }

    fn subscribe(
        &self,
        collection: &str,
        selector: &Selector,
        on_snapshot: SnapshotCallback<String>,
        on_error: ErrorCallback,
    ) -> CancelHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.subscriptions.borrow_mut().push(Subscription {
            collection: collection.to_string(),
            selector: selector.clone(),
            on_snapshot: Some(on_snapshot),
            on_error: Some(on_error),
            cancelled: Rc::clone(&cancelled),
        });
        CancelHandle::new(move || cancelled.set(true))
    }
}
