//! # Tether Host
//!
//! A reference [`DocumentSource`](tether_engine::DocumentSource) and a
//! minimal render loop for driving Tether bindings outside a UI framework.
//!
//! - [`MemoryStore`] - thread-safe in-memory documents with live watchers
//! - [`StoreSource`] - delivers store reads to bindings from `spawn_local`
//!   tasks, with simulated latency
//! - [`Host`] - turns binding listeners into awaitable updates
//!
//! Everything that touches bindings runs on one thread inside a
//! `tokio::task::LocalSet`.

pub mod config;
pub mod document;
pub mod error;
pub mod host;
pub mod source;
pub mod store;

pub use config::{Config, ConfigError};
pub use document::Document;
pub use error::{AppError, Result};
pub use host::Host;
pub use source::StoreSource;
pub use store::{MemoryStore, Snapshot, SnapshotSender, SubscriptionId};
