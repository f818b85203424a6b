//! The in-memory provider: collection-name routing over tables.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::stream::{self, BoxStream, StreamExt};
use mea::rwlock::RwLock;
use tracing::debug;

use datakit_core::{
    error::StoreResult,
    provider::{Provider, ProviderBuilder},
    statement::Statement,
    update::Update,
};

use crate::table::Table;

/// In-memory [`Provider`] implementation.
///
/// Routes every operation to the [`Table`] keyed by collection name,
/// lazily creating tables on first access. Tables live for the lifetime of
/// the store; only [`MemoryStore::reset`] replaces the whole map.
///
/// `MemoryStore` is cloneable and shares its state across clones, so it can
/// be handed to any number of async tasks.
///
/// # Performance
///
/// Queries scan all records in a table (no indexing). For small to medium
/// collections this is typically acceptable; larger deployments belong on a
/// backend with real indexes.
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing a `MemoryStore`.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder
    }

    /// Resolves the table for a collection name, creating it on first
    /// access. Tables are memoized and never removed individually.
    pub async fn table(&self, name: &str) -> Table {
        if let Some(table) = self.tables.read().await.get(name) {
            return table.clone();
        }

        let mut tables = self.tables.write().await;

        tables
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(collection = name, "creating table");
                Table::new(name)
            })
            .clone()
    }

    /// Lists the names of all collections touched so far.
    pub async fn collections(&self) -> Vec<String> {
        self.tables
            .read()
            .await
            .keys()
            .cloned()
            .collect()
    }

    /// Drops every table, replacing the whole map.
    ///
    /// Streams subscribed to old tables keep watching those tables' (now
    /// detached) state; new lookups see fresh empty tables.
    pub async fn reset(&self) {
        *self.tables.write().await = HashMap::new();
    }
}

#[async_trait]
impl Provider for MemoryStore {
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.table(collection).await.get_item(id).await)
    }

    async fn add_item(&self, collection: &str, data: Document) -> StoreResult<String> {
        Ok(self.table(collection).await.add_item(data).await)
    }

    async fn set_item(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.table(collection)
            .await
            .set_item(id, data)
            .await;

        Ok(())
    }

    async fn update_item(&self, collection: &str, id: &str, updates: Update) -> StoreResult<()> {
        self.table(collection)
            .await
            .update_item(id, &updates)
            .await
    }

    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.table(collection)
            .await
            .delete_item(id)
            .await;

        Ok(())
    }

    async fn get_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .table(collection)
            .await
            .get_query(&statement)
            .await)
    }

    async fn set_query(
        &self,
        collection: &str,
        statement: Statement,
        data: Document,
    ) -> StoreResult<usize> {
        Ok(self
            .table(collection)
            .await
            .set_query(&statement, data)
            .await)
    }

    async fn update_query(
        &self,
        collection: &str,
        statement: Statement,
        updates: Update,
    ) -> StoreResult<usize> {
        Ok(self
            .table(collection)
            .await
            .update_query(&statement, &updates)
            .await)
    }

    async fn delete_query(&self, collection: &str, statement: Statement) -> StoreResult<usize> {
        Ok(self
            .table(collection)
            .await
            .delete_query(&statement)
            .await)
    }

    fn watch_item(&self, collection: &str, id: &str) -> BoxStream<'static, Option<Document>> {
        let store = self.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        stream::once(async move {
            store
                .table(&collection)
                .await
                .item_stream(&id)
        })
        .flatten()
        .boxed()
    }

    fn watch_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> BoxStream<'static, Vec<Document>> {
        let store = self.clone();
        let collection = collection.to_string();

        stream::once(async move {
            store
                .table(&collection)
                .await
                .query_stream(statement)
        })
        .flatten()
        .boxed()
    }
}

/// Builder for constructing [`MemoryStore`] instances.
#[derive(Default)]
pub struct MemoryStoreBuilder;

#[async_trait]
impl ProviderBuilder for MemoryStoreBuilder {
    type Provider = MemoryStore;

    /// Builds a fresh store. This always succeeds.
    async fn build(self) -> StoreResult<Self::Provider> {
        Ok(MemoryStore::new())
    }
}
