//! In-memory document store with live watchers.
//!
//! Holds every document of one project and pushes full snapshots to
//! registered watchers whenever a collection they watch is written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tether_engine::{error::Result, Error, Query, Selector};
use tokio::sync::mpsc;

use crate::document::Document;

/// Identifier of a registered watcher.
pub type SubscriptionId = String;

/// What a watcher receives: a full snapshot or the error that ended it.
pub type Snapshot = Result<Vec<Document>>;

/// Sender side of a watcher's channel.
pub type SnapshotSender = mpsc::UnboundedSender<Snapshot>;

/// A single watcher registration.
#[derive(Debug)]
struct Watcher {
    collection: String,
    selector: Selector,
    sender: SnapshotSender,
}

/// Documents of one project, keyed by `(collection, id)`.
///
/// Thread-safe and can be shared via `Arc`.
#[derive(Debug)]
pub struct MemoryStore {
    project_id: String,
    documents: DashMap<(String, String), Document>,
    watchers: DashMap<SubscriptionId, Watcher>,
    locked: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store for `project_id`.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            documents: DashMap::new(),
            watchers: DashMap::new(),
            locked: AtomicBool::new(false),
        }
    }

    /// Create an empty store wrapped in Arc for sharing.
    pub fn new_shared(project_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(project_id))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Insert or replace a document and notify watchers of its collection.
    pub fn set(&self, collection: &str, id: &str, data: Value) -> Document {
        let doc = Document::new(collection, id, data);
        self.documents
            .insert((collection.to_string(), id.to_string()), doc.clone());

        tracing::debug!(collection = %collection, id = %id, "Document written");
        self.notify(collection);
        doc
    }

    /// Delete a document. Watchers are only notified if it existed.
    pub fn remove(&self, collection: &str, id: &str) -> Option<Document> {
        let (_, doc) = self
            .documents
            .remove(&(collection.to_string(), id.to_string()))?;

        tracing::debug!(collection = %collection, id = %id, "Document removed");
        self.notify(collection);
        Some(doc)
    }

    /// Point read. `Ok(None)` when the document does not exist.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.check_access()?;
        Ok(self
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    /// Run a query over one collection.
    ///
    /// Documents enter the query in id order, so results without an
    /// explicit ordering are still deterministic.
    pub fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        self.check_access()?;
        let docs = self.collection(collection);
        if query.is_all() {
            return Ok(docs);
        }
        Ok(query.apply(docs))
    }

    /// Resolve a subscription selector to its current result.
    pub fn select(&self, collection: &str, selector: &Selector) -> Result<Vec<Document>> {
        match selector {
            Selector::Document(id) => Ok(self.get(collection, id)?.into_iter().collect()),
            Selector::Query(query) => self.query(collection, query),
        }
    }

    /// Deny every read until [`unlock`](Self::unlock).
    ///
    /// Active watchers receive the error; the engine treats it as terminal.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
        tracing::info!(project = %self.project_id, "Store locked");

        let err = self.denied();
        for entry in self.watchers.iter() {
            let _ = entry.value().sender.send(Err(err.clone()));
        }
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
        tracing::info!(project = %self.project_id, "Store unlocked");
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Register a watcher. The current snapshot is sent immediately.
    ///
    /// The watcher is registered before the first snapshot is read, so a
    /// concurrent write is either in that snapshot or pushed after it.
    ///
    /// Returns the subscription ID.
    pub fn watch(&self, collection: &str, selector: Selector, sender: SnapshotSender) -> SubscriptionId {
        let sub_id = uuid::Uuid::new_v4().to_string();

        let initial = self.select(collection, &selector);
        self.watchers.insert(
            sub_id.clone(),
            Watcher {
                collection: collection.to_string(),
                selector,
                sender: sender.clone(),
            },
        );
        let _ = sender.send(initial);

        tracing::info!(sub_id = %sub_id, collection = %collection, "Watcher registered");
        sub_id
    }

    /// Remove a watcher. Returns whether it was registered.
    pub fn unwatch(&self, sub_id: &str) -> bool {
        match self.watchers.remove(sub_id) {
            Some((_, watcher)) => {
                tracing::info!(sub_id = %sub_id, collection = %watcher.collection, "Watcher unregistered");
                true
            }
            None => false,
        }
    }

    /// Get the number of active watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn collection(&self, collection: &str) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.value().clone())
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    /// Send fresh snapshots to every watcher of `collection`.
    ///
    /// Watchers whose receiver is gone are dropped.
    fn notify(&self, collection: &str) {
        let targets: Vec<(SubscriptionId, Selector, SnapshotSender)> = self
            .watchers
            .iter()
            .filter(|entry| entry.value().collection == collection)
            .map(|entry| {
                let watcher = entry.value();
                (entry.key().clone(), watcher.selector.clone(), watcher.sender.clone())
            })
            .collect();

        let mut sent_count = 0;
        for (sub_id, selector, sender) in targets {
            if sender.send(self.select(collection, &selector)).is_ok() {
                sent_count += 1;
            } else {
                self.unwatch(&sub_id);
            }
        }

        tracing::debug!(collection = %collection, recipients = sent_count, "Snapshot pushed to watchers");
    }

    fn check_access(&self) -> Result<()> {
        if self.is_locked() {
            Err(self.denied())
        } else {
            Ok(())
        }
    }

    fn denied(&self) -> Error {
        Error::PermissionDenied(format!(
            "missing or insufficient permissions for project {}",
            self.project_id
        ))
    }
}
