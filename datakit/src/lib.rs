//! Main datakit crate providing a unified interface for reactive data access.
//!
//! This crate is the primary entry point for users of the datakit toolkit.
//! It re-exports the core types and functionality from various sub-crates,
//! provides the in-memory backend, and adds decorating providers for caching
//! and runtime backend swapping.
//!
//! # Features
//!
//! - **Type-safe record storage** - Define your data structures with Serde and store them safely
//! - **Flexible querying** - Composable filter/sort/limit statements evaluated uniformly across backends
//! - **Change notification** - Subscription streams that yield fresh results whenever matching data changes
//! - **Composable providers** - Caching and delegation wrappers that stack over any backend
//!
//! # Quick Start
//!
//! ```ignore
//! use datakit::{prelude::*, memory::MemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl Record for User {
//!     fn id(&self) -> &str { &self.id }
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DataStore::new(MemoryStore::builder().build().await.unwrap());
//!
//!     let users = store.typed_collection::<User>();
//!
//!     let user = User {
//!         id: "u-1".to_string(),
//!         name: "Alice".to_string(),
//!     };
//!
//!     users.insert(vec![user.clone()]).await.unwrap();
//!
//!     let results = users
//!         .query(Statement::new().with_filter("name", Operator::Is, "Alice"))
//!         .await
//!         .unwrap();
//!
//!     println!("Queried users: {:?}", results);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Watching for Changes
//!
//! Every provider exposes `watch_item` and `watch_query` streams. A stream
//! yields the current result immediately and again after each relevant write,
//! suppressing consecutive duplicates:
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut adults = store
//!     .collection("users")
//!     .watch_query(Statement::new().with_filter("age", Operator::Gte, 18));
//!
//! while let Some(matches) = adults.next().await {
//!     println!("{} adults", matches.len());
//! }
//! ```
//!
//! # Providers
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`cache`] - Read-through cache layered over another provider
//! - [`relay`] - Delegation wrapper with a runtime-swappable target

pub mod cache;
pub mod prelude;
pub mod relay;

pub use datakit_core::{
    collection, constraint, error, provider, record, statement, store, update, value,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory provider implementations.
pub mod memory {
    pub use datakit_memory::{MemoryStore, MemoryStoreBuilder, Table};
}
