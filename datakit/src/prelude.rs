//! Convenient re-exports of commonly used types from datakit.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use datakit::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record traits and implementations
//! - Store providers and builders
//! - Statement construction, filtering, and sorting
//! - Collection interfaces
//! - Error types and decorating providers

pub use datakit_core::{
    collection::{Collection, TypedCollection},
    constraint::{Direction, Filter, FilterSet, Operator, Sort, SortSet},
    error::{StoreError, StoreResult},
    provider::{Provider, ProviderBuilder},
    record::{Record, RecordExt},
    statement::Statement,
    store::DataStore,
    update::Update,
};

pub use datakit_memory::MemoryStore;

pub use crate::{cache::CacheProvider, relay::RelayProvider};
