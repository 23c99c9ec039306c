//! Bindings driven by the in-memory store on a local task set.

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tether_engine::{
    Direction, Error, FilterOp, LiveCollectionBinding, Phase, Query, SingleFetchBinding, Target,
};
use tether_host::{AppError, Config, Document, Host, MemoryStore, StoreSource};
use tokio::task::LocalSet;

fn test_config() -> Config {
    Config {
        project_id: "test-project".to_string(),
        fetch_latency: Duration::from_millis(2),
        push_latency: Duration::ZERO,
        update_timeout: Duration::from_millis(500),
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new_shared("test-project");
    store.set("books", "sapiens", json!({"title": "Sapiens", "year": 2011}));
    store.set(
        "books",
        "22laws",
        json!({"title": "The 22 Immutable Laws of Marketing", "year": 1993}),
    );
    store.set("books", "momtest", json!({"title": "The Mom Test", "year": 2013}));
    store.set("orders", "order1", json!({"book": "sapiens", "quantity": 1}));
    store
}

struct Fixture {
    store: Arc<MemoryStore>,
    source: Rc<StoreSource>,
    host: Host,
}

impl Fixture {
    fn new() -> Self {
        let config = test_config();
        let store = seeded_store();
        Self {
            source: Rc::new(StoreSource::new(Arc::clone(&store), &config)),
            host: Host::new(&config),
            store,
        }
    }

    fn fetch(&self) -> SingleFetchBinding<Rc<StoreSource>> {
        SingleFetchBinding::new(Rc::clone(&self.source)).with_listener(self.host.listener())
    }

    fn live(&self) -> LiveCollectionBinding<Rc<StoreSource>> {
        LiveCollectionBinding::new(Rc::clone(&self.source)).with_listener(self.host.listener())
    }
}

async fn local<F: Future<Output = ()>>(test: F) {
    LocalSet::new().run_until(test).await;
}

async fn drain_tasks() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn title(doc: &Option<Document>) -> Option<&str> {
    doc.as_ref().and_then(|doc| doc.str_field("title"))
}

fn titles(docs: &[Document]) -> Vec<&str> {
    docs.iter().filter_map(|doc| doc.str_field("title")).collect()
}

// ============================================================================
// Single fetch
// ============================================================================

#[tokio::test]
async fn fetch_existing_document() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.fetch();
        let target = Target::by_id("books", "sapiens");

        let view = binding.observe(Some(&target));
        assert!(view.loading);
        assert_eq!(view.data, None);

        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        let view = binding.observe(Some(&target));
        assert_eq!(view.data.as_ref().and_then(title), Some("Sapiens"));
        assert!(!view.loading);
        assert_eq!(view.error, None);
    })
    .await;
}

#[tokio::test]
async fn fetch_missing_document() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.fetch();

        binding.observe(Some(&Target::by_id("books", "hp1")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();

        let view = binding.view();
        assert_eq!(view.data, Some(None));
        assert!(!view.loading);
    })
    .await;
}

#[tokio::test]
async fn rapid_switch_keeps_latest() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.fetch();

        binding.observe(Some(&Target::by_id("books", "sapiens")));
        binding.observe(Some(&Target::by_id("orders", "order1")));

        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        drain_tasks().await;

        let view = binding.view();
        let doc = view.data.flatten().unwrap();
        assert_eq!(doc.collection, "orders");
        assert_eq!(doc.data["quantity"], 1);
        assert_eq!(fx.host.updates(), 1, "stale result must not notify");
    })
    .await;
}

#[tokio::test]
async fn fetch_query_target() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.fetch();
        let target = Target::query(
            "books",
            Query::all()
                .filter("year", FilterOp::Gt, 2000)
                .order_by("year", Direction::Desc),
        );

        binding.observe(Some(&target));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        assert_eq!(binding.view().data.as_ref().and_then(title), Some("The Mom Test"));
    })
    .await;
}

#[tokio::test]
async fn fetch_permission_denied() {
    local(async {
        let fx = Fixture::new();
        fx.store.lock();
        let mut binding = fx.fetch();

        binding.observe(Some(&Target::by_id("books", "sapiens")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();

        let view = binding.view();
        assert_eq!(view.data, None);
        assert!(!view.loading);
        assert_eq!(view.error.map(|err| err.code()), Some("permission-denied"));
    })
    .await;
}

#[tokio::test]
async fn dispose_discards_in_flight_fetch() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.fetch();

        binding.observe(Some(&Target::by_id("books", "sapiens")));
        binding.dispose();
        drain_tasks().await;

        assert_eq!(fx.host.updates(), 0);
        assert!(binding.state().is_unresolved());
    })
    .await;
}

// ============================================================================
// Live collection
// ============================================================================

#[tokio::test]
async fn live_collection_follows_writes() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();
        let target = Target::query("books", Query::all().order_by("title", Direction::Asc));

        assert!(binding.observe(Some(&target)).loading);
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        assert_eq!(
            titles(&binding.view().data.unwrap()),
            vec!["Sapiens", "The 22 Immutable Laws of Marketing", "The Mom Test"]
        );

        fx.store.set("books", "hp1", json!({"title": "Harry Potter"}));
        fx.host
            .wait_until(|| binding.view().data.is_some_and(|docs| docs.len() == 4))
            .await
            .unwrap();
        assert_eq!(titles(&binding.view().data.unwrap())[0], "Harry Potter");

        fx.store.remove("books", "sapiens");
        fx.host
            .wait_until(|| binding.view().data.is_some_and(|docs| docs.len() == 3))
            .await
            .unwrap();

        assert_eq!(binding.subscriptions_opened(), 1);
        assert_eq!(fx.store.watcher_count(), 1);
    })
    .await;
}

#[tokio::test]
async fn live_empty_collection() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();

        binding.observe(Some(&Target::all("nope")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();

        let view = binding.view();
        assert_eq!(view.data, Some(vec![]));
        assert!(!view.loading);
        assert_eq!(view.error, None);
    })
    .await;
}

#[tokio::test]
async fn live_document_target() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();

        binding.observe(Some(&Target::reference("books", "sapiens")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        assert_eq!(titles(&binding.view().data.unwrap()), vec!["Sapiens"]);

        fx.store
            .set("books", "sapiens", json!({"title": "Sapiens (revised)"}));
        fx.host
            .wait_until(|| {
                binding
                    .view()
                    .data
                    .is_some_and(|docs| titles(&docs) == vec!["Sapiens (revised)"])
            })
            .await
            .unwrap();
    })
    .await;
}

#[tokio::test]
async fn switching_collections_replaces_watcher() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();

        binding.observe(Some(&Target::all("books")));
        binding.observe(Some(&Target::all("orders")));
        assert_eq!(fx.store.watcher_count(), 1);

        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        let docs = binding.view().data.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "order1");

        // Writes to the abandoned collection no longer reach the binding
        let before = fx.host.updates();
        fx.store.set("books", "hp1", json!({"title": "Harry Potter"}));
        drain_tasks().await;
        assert_eq!(fx.host.updates(), before);
    })
    .await;
}

#[tokio::test]
async fn lock_while_subscribed_surfaces_error() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();

        binding.observe(Some(&Target::all("books")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();

        fx.store.lock();
        fx.host
            .wait_until(|| binding.view().error.is_some())
            .await
            .unwrap();

        assert!(matches!(binding.view().error, Some(Error::PermissionDenied(_))));
        assert_eq!(binding.phase(), Phase::Failed);
        assert_eq!(binding.view().data, None);

        // Unlocking does not revive the failed subscription
        fx.store.unlock();
        fx.store.set("books", "hp1", json!({"title": "Harry Potter"}));
        drain_tasks().await;
        assert_eq!(binding.phase(), Phase::Failed);
    })
    .await;
}

#[tokio::test]
async fn dispose_unwatches_store() {
    local(async {
        let fx = Fixture::new();
        let mut binding = fx.live();

        binding.observe(Some(&Target::all("books")));
        fx.host.wait_until(|| binding.view().is_settled()).await.unwrap();
        assert_eq!(fx.store.watcher_count(), 1);
        let before = fx.host.updates();

        binding.dispose();
        assert_eq!(fx.store.watcher_count(), 0);

        fx.store.set("books", "hp1", json!({"title": "Harry Potter"}));
        drain_tasks().await;
        assert_eq!(fx.host.updates(), before);
    })
    .await;
}

#[tokio::test]
async fn dropping_binding_unwatches_store() {
    local(async {
        let fx = Fixture::new();
        {
            let mut binding = fx.live();
            binding.observe(Some(&Target::all("books")));
            assert_eq!(fx.store.watcher_count(), 1);
        }
        assert_eq!(fx.store.watcher_count(), 0);
    })
    .await;
}

// ============================================================================
// Host
// ============================================================================

#[tokio::test]
async fn wait_times_out_without_activity() {
    local(async {
        let config = Config {
            update_timeout: Duration::from_millis(10),
            ..test_config()
        };
        let host = Host::new(&config);

        let err = host.wait_for_update().await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
    })
    .await;
}
