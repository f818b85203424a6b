//! In-memory provider for datakit.
//!
//! This crate provides the in-memory query engine behind the
//! [`Provider`](datakit_core::provider::Provider) contract: per-collection
//! [`Table`]s storing BSON records, statement evaluation, change-time
//! bookkeeping, and live subscription streams driven by a per-table
//! broadcast change signal.
//!
//! # Concurrency model
//!
//! Cooperative and coarse-grained: each table's state sits behind one
//! async read-write lock, every operation runs to completion under that
//! lock, and a single shared change signal per table wakes every
//! subscriber after any write. Each subscriber independently decides, by
//! comparing against its own last-yielded value, whether the wakeup was
//! relevant. That trades O(subscribers) wakeups per write for not having
//! to track fine-grained dependencies.
//!
//! # Quick Start
//!
//! ```ignore
//! use datakit_core::{statement::Statement, constraint::Operator, store::DataStore};
//! use datakit_memory::MemoryStore;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DataStore::new(MemoryStore::new());
//!     let users = store.collection("users");
//!
//!     let id = users.add(doc! { "name": "Alice", "age": 30 }).await?;
//!     let adults = users
//!         .query(Statement::new().with_filter("age", Operator::Gte, 18))
//!         .await?;
//!     assert_eq!(adults.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as datakit_memory;

pub mod store;
pub mod table;

mod signal;

pub use store::{MemoryStore, MemoryStoreBuilder};
pub use table::Table;
