//! A read-through caching provider.

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use chrono::{Duration, Utc};
use futures::stream::BoxStream;
use tracing::debug;

use datakit_core::{
    error::StoreResult,
    provider::Provider,
    statement::Statement,
    update::Update,
};
use datakit_memory::MemoryStore;

/// Decorating provider that serves reads from an in-memory cache while
/// they are fresh, falling back to the wrapped provider otherwise.
///
/// Freshness is decided per item and per statement from the cache tables'
/// change-time bookkeeping: a point read is fresh while the id's time is
/// within `max_age`, a query read while the statement's canonical key was
/// explicitly stored within `max_age`. Queries that were never cached
/// report unknown age and always go through.
///
/// Writes go through to the inner provider; point writes are mirrored into
/// the cache, query-scoped writes coarsely invalidate the collection.
/// Subscriptions bypass the cache entirely and delegate to the inner
/// provider, which is the source of truth for change notification.
#[derive(Debug, Clone)]
pub struct CacheProvider {
    inner: Arc<dyn Provider>,
    cache: MemoryStore,
    max_age: Duration,
}

impl CacheProvider {
    /// Wraps `inner`, caching reads for at most `max_age`.
    pub fn new(inner: Arc<dyn Provider>, max_age: Duration) -> Self {
        Self { inner, cache: MemoryStore::new(), max_age }
    }

    fn fresh(&self, stamp: Option<chrono::DateTime<Utc>>) -> bool {
        matches!(stamp, Some(stamp) if Utc::now() - stamp <= self.max_age)
    }
}

#[async_trait]
impl Provider for CacheProvider {
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let table = self.cache.table(collection).await;

        if self.fresh(table.item_time(id).await) {
            debug!(collection, id, "cache hit");
            return Ok(table.get_item(id).await);
        }

        debug!(collection, id, "cache miss");
        let fetched = self.inner.get_item(collection, id).await?;

        match &fetched {
            Some(item) => table.set_item(id, item.clone()).await,
            None => table.delete_item(id).await,
        }

        Ok(fetched)
    }

    async fn add_item(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = self
            .inner
            .add_item(collection, data.clone())
            .await?;

        self.cache
            .table(collection)
            .await
            .set_item(&id, data)
            .await;

        Ok(id)
    }

    async fn set_item(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.inner
            .set_item(collection, id, data.clone())
            .await?;

        self.cache
            .table(collection)
            .await
            .set_item(id, data)
            .await;

        Ok(())
    }

    async fn update_item(&self, collection: &str, id: &str, updates: Update) -> StoreResult<()> {
        self.inner
            .update_item(collection, id, updates)
            .await?;

        // Refresh rather than patch: the inner provider owns update
        // semantics, so mirror its post-update value.
        let table = self.cache.table(collection).await;

        match self.inner.get_item(collection, id).await? {
            Some(item) => table.set_item(id, item).await,
            None => table.delete_item(id).await,
        }

        Ok(())
    }

    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete_item(collection, id).await?;

        self.cache
            .table(collection)
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
        let table = self.cache.table(collection).await;

        if self.fresh(table.query_time(&statement).await) {
            debug!(collection, key = %statement.key(), "query cache hit");
            return Ok(table.get_query(&statement).await);
        }

        debug!(collection, key = %statement.key(), "query cache miss");
        let results = self
            .inner
            .get_query(collection, statement.clone())
            .await?;

        table
            .set_query_items(&statement, results.clone())
            .await;

        Ok(results)
    }

    async fn set_query(
        &self,
        collection: &str,
        statement: Statement,
        data: Document,
    ) -> StoreResult<usize> {
        let count = self
            .inner
            .set_query(collection, statement, data)
            .await?;

        // The affected set is the inner provider's call; invalidate the
        // whole collection rather than guessing.
        self.cache.table(collection).await.clear().await;

        Ok(count)
    }

    async fn update_query(
        &self,
        collection: &str,
        statement: Statement,
        updates: Update,
    ) -> StoreResult<usize> {
        let count = self
            .inner
            .update_query(collection, statement, updates)
            .await?;

        self.cache.table(collection).await.clear().await;

        Ok(count)
    }

    async fn delete_query(&self, collection: &str, statement: Statement) -> StoreResult<usize> {
        let count = self
            .inner
            .delete_query(collection, statement)
            .await?;

        self.cache.table(collection).await.clear().await;

        Ok(count)
    }

    fn watch_item(&self, collection: &str, id: &str) -> BoxStream<'static, Option<Document>> {
        self.inner.watch_item(collection, id)
    }

    fn watch_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> BoxStream<'static, Vec<Document>> {
        self.inner.watch_query(collection, statement)
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.inner.shutdown().await
    }
}
