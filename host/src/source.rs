//! `DocumentSource` over a [`MemoryStore`].
//!
//! Every completion is delivered from a `spawn_local` task after the
//! configured latency, never from inside the request. Bindings therefore
//! see the same ordering a networked backend would give them, including
//! responses that arrive after the binding moved on.
//!
//! All methods must be called from within a `tokio::task::LocalSet`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::abortable;
use tether_engine::{
    CancelHandle, DocumentSource, ErrorCallback, FetchCallback, Query, QueryCallback, Selector,
    SnapshotCallback,
};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::document::Document;
use crate::store::MemoryStore;

/// Document source backed by a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoreSource {
    store: Arc<MemoryStore>,
    fetch_latency: Duration,
    push_latency: Duration,
}

impl StoreSource {
    pub fn new(store: Arc<MemoryStore>, config: &Config) -> Self {
        Self {
            store,
            fetch_latency: config.fetch_latency,
            push_latency: config.push_latency,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

async fn delay(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

impl DocumentSource for StoreSource {
    type Doc = Document;

    fn fetch_one(&self, collection: &str, id: &str, on_done: FetchCallback<Document>) {
        let store = Arc::clone(&self.store);
        let (collection, id) = (collection.to_string(), id.to_string());
        let latency = self.fetch_latency;

        tokio::task::spawn_local(async move {
            delay(latency).await;
            let outcome = store.get(&collection, &id);
            tracing::debug!(collection = %collection, id = %id, ok = outcome.is_ok(), "Fetch completed");
            on_done(outcome);
        });
    }

    fn fetch_query(&self, collection: &str, query: &Query, on_done: QueryCallback<Document>) {
        let store = Arc::clone(&self.store);
        let collection = collection.to_string();
        let query = query.clone();
        let latency = self.fetch_latency;

        tokio::task::spawn_local(async move {
            delay(latency).await;
            let outcome = store.query(&collection, &query);
            tracing::debug!(collection = %collection, query = %query.canonical(), "Query completed");
            on_done(outcome);
        });
    }

    fn subscribe(
        &self,
        collection: &str,
        selector: &Selector,
        mut on_snapshot: SnapshotCallback<Document>,
        mut on_error: ErrorCallback,
    ) -> CancelHandle {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub_id = self.store.watch(collection, selector.clone(), tx);
        let latency = self.push_latency;

        let forward = async move {
            while let Some(snapshot) = rx.recv().await {
                delay(latency).await;
                match snapshot {
                    Ok(docs) => on_snapshot(docs),
                    Err(err) => {
                        on_error(err);
                        break;
                    }
                }
            }
        };
        let (task, abort) = abortable(forward);
        tokio::task::spawn_local(task);

        let store = Arc::clone(&self.store);
        CancelHandle::new(move || {
            abort.abort();
            store.unwatch(&sub_id);
        })
    }
}
