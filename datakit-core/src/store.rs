//! The data store facade over a provider.
//!
//! [`DataStore`] is intentionally thin: its only job is handing out
//! namespaced [`Collection`]/[`TypedCollection`] handles for a provider.
//!
//! # Example
//!
//! ```ignore
//! use datakit_core::store::DataStore;
//!
//! let store = DataStore::new(provider);
//! let users = store.collection("users");
//! let typed = store.typed_collection::<User>();
//! ```

use crate::{
    collection::{Collection, TypedCollection},
    error::StoreResult,
    provider::Provider,
    record::Record,
};

/// A data store bound to a provider implementation.
///
/// Works equally with a concrete provider type or an `Arc<dyn Provider>`
/// selected at runtime.
#[derive(Debug)]
pub struct DataStore<P: Provider> {
    provider: P,
}

impl<P: Provider> DataStore<P> {
    /// Creates a new data store over the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Gets an untyped handle for the named collection.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, P> {
        Collection::new(name.to_string(), &self.provider)
    }

    /// Gets a typed handle for the record type's collection.
    ///
    /// The collection name is determined by [`Record::collection_name`].
    pub fn typed_collection<'a, R: Record>(&'a self) -> TypedCollection<'a, P, R> {
        TypedCollection::new(R::collection_name().to_string(), &self.provider)
    }

    /// Shuts down the underlying provider.
    pub async fn shutdown(&self) -> StoreResult<()> {
        self.provider.shutdown().await
    }
}
