//! # Tether Engine
//!
//! Identity-keyed bindings between a document store and reactive UI state.
//!
//! A host (a UI component, a TUI widget, a test harness) calls `observe` on
//! every render with the target it wants. The engine decides whether that
//! target is new, issues at most one read or subscription for it, and hands
//! back a [`View`] with `data`, `loading` and `error`. Results that arrive
//! for a target the host has since moved away from are discarded.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine talks to storage only through [`DocumentSource`]
//! - **No runtime**: sources call back; the engine never spawns or blocks
//! - **Single-threaded**: bindings live on the host's render thread
//! - **Never stale**: every callback is checked against the identity it was
//!   issued for
//!
//! ## Core Concepts
//!
//! ### Targets and identity
//!
//! A [`Target`] names a document or a collection query. Its [`IdentityKey`]
//! is the structural, comparable form of it: two targets built separately
//! but naming the same thing share a key, and repeated renders with the same
//! key do no work. [`Query::canonical`] makes query keys independent of
//! filter order.
//!
//! ### Bindings
//!
//! - [`SingleFetchBinding`] - one point read per identity
//! - [`LiveCollectionBinding`] - one live subscription per identity,
//!   replacing its sequence on every snapshot
//!
//! Both expose a [`ResultState`] (`Unresolved`, `Value`, `Failed`) and a
//! derived [`View`].
//!
//! ## Quick Start
//!
//! ```rust
//! use tether_engine::{
//!     CancelHandle, DocumentSource, ErrorCallback, FetchCallback, Query,
//!     QueryCallback, Selector, SingleFetchBinding, SnapshotCallback, Target,
//! };
//!
//! // A source that answers every read synchronously.
//! struct Echo;
//!
//! impl DocumentSource for Echo {
//!     type Doc = String;
//!
//!     fn fetch_one(&self, collection: &str, id: &str, on_done: FetchCallback<String>) {
//!         on_done(Ok(Some(format!("{collection}/{id}"))));
//!     }
//!
//!     fn fetch_query(&self, _: &str, _: &Query, on_done: QueryCallback<String>) {
//!         on_done(Ok(vec![]));
//!     }
//!
//!     fn subscribe(
//!         &self,
//!         _: &str,
//!         _: &Selector,
//!         _: SnapshotCallback<String>,
//!         _: ErrorCallback,
//!     ) -> CancelHandle {
//!         CancelHandle::noop()
//!     }
//! }
//!
//! let mut binding = SingleFetchBinding::new(Echo);
//! let view = binding.observe(Some(&Target::by_id("books", "sapiens")));
//!
//! assert_eq!(view.data, Some(Some("books/sapiens".to_string())));
//! assert!(!view.loading);
//! ```

pub mod collaborator;
pub mod effect;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod live;
pub mod query;
pub mod state;
pub mod target;

mod scope;
#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use collaborator::{
    CancelHandle, DocumentSource, ErrorCallback, FetchCallback, QueryCallback, SnapshotCallback,
};
pub use effect::{Cleanup, Effect};
pub use error::Error;
pub use fetch::SingleFetchBinding;
pub use identity::IdentityKey;
pub use live::{LiveCollectionBinding, Multiplexer, Phase};
pub use query::{Direction, Fields, Filter, FilterOp, OrderBy, Query};
pub use state::{ResultCell, ResultState, View};
pub use target::{DocRef, Selector, Target};

/// Type aliases for clarity
pub type CollectionId = String;
pub type DocumentId = String;
