//! Tether demo host.
//!
//! Seeds an in-memory `books` collection and walks a single-fetch binding
//! and a live collection binding through target changes, writes, an empty
//! collection and a permission failure, logging every view it renders.

use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::json;
use tether_engine::{Direction, LiveCollectionBinding, Query, SingleFetchBinding, Target, View};
use tether_host::{Config, Document, Host, MemoryStore, StoreSource};
use tokio::task::LocalSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_host=debug,tether_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(project = %config.project_id, "Starting Tether demo host");

    LocalSet::new().run_until(run(config)).await?;

    tracing::info!("Demo finished");
    Ok(())
}

async fn run(config: Config) -> tether_host::Result<()> {
    let store = MemoryStore::new_shared(config.project_id.clone());
    seed(&store);

    let source = Rc::new(StoreSource::new(Arc::clone(&store), &config));
    let host = Host::new(&config);

    // Point reads
    let mut book = SingleFetchBinding::new(Rc::clone(&source)).with_listener(host.listener());

    let sapiens = Target::by_id("books", "sapiens");
    render("book", &book.observe(Some(&sapiens)), titles_of_one);
    host.wait_until(|| book.view().is_settled()).await?;
    render("book", &book.observe(Some(&sapiens)), titles_of_one);

    // Two quick switches; only the last one may land
    render("book", &book.observe(Some(&Target::by_id("books", "22laws"))), titles_of_one);
    let momtest = Target::by_id("books", "momtest");
    render("book", &book.observe(Some(&momtest)), titles_of_one);
    host.wait_until(|| book.view().is_settled()).await?;
    render("book", &book.observe(Some(&momtest)), titles_of_one);

    let missing = Target::by_id("books", "hp1");
    book.observe(Some(&missing));
    host.wait_until(|| book.view().is_settled()).await?;
    render("book", &book.observe(Some(&missing)), titles_of_one);

    render("book", &book.observe(None), titles_of_one);

    // Live collection
    let mut shelf = LiveCollectionBinding::new(Rc::clone(&source)).with_listener(host.listener());

    let by_title = Target::query("books", Query::all().order_by("title", Direction::Asc));
    shelf.observe(Some(&by_title));
    host.wait_until(|| shelf.view().is_settled()).await?;
    render("shelf", &shelf.observe(Some(&by_title)), |docs: &Vec<Document>| titles(docs));

    store.set("books", "hp1", json!({"title": "Harry Potter", "year": 1997}));
    host.wait_until(|| shelf.view().data.is_some_and(|docs| docs.len() == 4))
        .await?;
    render("shelf", &shelf.observe(Some(&by_title)), |docs: &Vec<Document>| titles(docs));

    let empty = Target::all("nope");
    shelf.observe(Some(&empty));
    host.wait_until(|| shelf.view().is_settled()).await?;
    render("shelf", &shelf.observe(Some(&empty)), |docs: &Vec<Document>| titles(docs));

    // Access revoked while subscribed
    shelf.observe(Some(&by_title));
    host.wait_until(|| shelf.view().is_settled()).await?;
    store.lock();
    host.wait_until(|| shelf.view().error.is_some()).await?;
    render("shelf", &shelf.observe(Some(&by_title)), |docs: &Vec<Document>| titles(docs));

    shelf.dispose();
    book.dispose();
    tracing::info!(
        watchers = store.watcher_count(),
        updates = host.updates(),
        "Bindings disposed"
    );

    Ok(())
}

fn seed(store: &MemoryStore) {
    store.set("books", "sapiens", json!({"title": "Sapiens", "year": 2011}));
    store.set(
        "books",
        "22laws",
        json!({"title": "The 22 Immutable Laws of Marketing", "year": 1993}),
    );
    store.set("books", "momtest", json!({"title": "The Mom Test", "year": 2013}));
    store.set("orders", "order1", json!({"book": "sapiens", "quantity": 1}));
}

fn titles_of_one(doc: &Option<Document>) -> Option<String> {
    doc.as_ref()
        .map(|doc| doc.str_field("title").unwrap_or(&doc.id).to_string())
}

fn titles(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|doc| doc.str_field("title").unwrap_or(&doc.id).to_string())
        .collect()
}

fn render<T, R: Debug>(binding: &str, view: &View<T>, summary: impl Fn(&T) -> R) {
    tracing::info!(
        binding,
        loading = view.loading,
        data = ?view.data.as_ref().map(summary),
        error = ?view.error,
        "render"
    );
}
