//! The provider contract implemented by every storage backend.
//!
//! A [`Provider`] exposes point reads and writes, constrained queries,
//! query-scoped writes, and live subscription streams over named
//! collections. The in-memory engine implements it directly; decorating
//! providers (caching, delegation) compose over it; adapters for external
//! document databases implement the same contract so callers can swap
//! backends transparently.
//!
//! The trait is object-safe: decorators and runtime-selected backends work
//! through `Arc<dyn Provider>` without a parallel type-erased trait.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;

use crate::{error::StoreResult, statement::Statement, update::Update};

/// Abstract read/write/query/subscribe interface over named collections.
///
/// # Error handling
///
/// "Absent" is a meaningful result, not an error: `get_item` returns
/// `None` and `delete_item` is a silent no-op for unknown ids. The one
/// deliberate hard failure is `update_item` on an absent id, which returns
/// [`StoreError::ItemRequired`](crate::error::StoreError::ItemRequired).
///
/// # Subscriptions
///
/// `watch_item` and `watch_query` return unending streams that yield the
/// current value immediately and then re-yield whenever the stored value
/// changes structurally. Bursts of writes are coalesced: a subscriber
/// observes the latest state, not every intermediate one. Dropping the
/// stream cancels the subscription; no explicit unsubscribe exists because
/// the stream holds no registration.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Point lookup. Returns `None` if the item is absent.
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Stores `data` under a freshly generated random id and returns the id.
    async fn add_item(&self, collection: &str, data: Document) -> StoreResult<String>;

    /// Full replace. The `id` parameter wins over any id embedded in `data`.
    async fn set_item(&self, collection: &str, id: &str, data: Document) -> StoreResult<()>;

    /// Partial update of an existing item. Fails with
    /// [`StoreError::ItemRequired`](crate::error::StoreError::ItemRequired)
    /// if the id is absent; updates never create.
    async fn update_item(&self, collection: &str, id: &str, updates: Update) -> StoreResult<()>;

    /// Removes the item if present; a silent no-op otherwise.
    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Evaluates the statement and returns the matching records as a snapshot.
    async fn get_query(&self, collection: &str, statement: Statement)
    -> StoreResult<Vec<Document>>;

    /// Replaces the full value of every record matched by the statement with
    /// `data` (each keeping its own id). Returns the affected count.
    async fn set_query(
        &self,
        collection: &str,
        statement: Statement,
        data: Document,
    ) -> StoreResult<usize>;

    /// Applies `updates` to every record matched by the statement. Only
    /// records that actually change count toward the returned total.
    async fn update_query(
        &self,
        collection: &str,
        statement: Statement,
        updates: Update,
    ) -> StoreResult<usize>;

    /// Removes every record matched by the statement. Returns the affected count.
    async fn delete_query(&self, collection: &str, statement: Statement) -> StoreResult<usize>;

    /// Unending stream of an item's value: the current value first, then a
    /// new value after each relevant change.
    fn watch_item(&self, collection: &str, id: &str) -> BoxStream<'static, Option<Document>>;

    /// Unending stream of a query's result set: the current results first,
    /// then new results after each change that alters them structurally.
    fn watch_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> BoxStream<'static, Vec<Document>>;

    /// Releases backend resources. The default implementation is a no-op;
    /// providers with external connections should override it.
    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get_item(collection, id).await
    }

    async fn add_item(&self, collection: &str, data: Document) -> StoreResult<String> {
        (**self).add_item(collection, data).await
    }

    async fn set_item(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        (**self)
            .set_item(collection, id, data)
            .await
    }

    async fn update_item(&self, collection: &str, id: &str, updates: Update) -> StoreResult<()> {
        (**self)
            .update_item(collection, id, updates)
            .await
    }

    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete_item(collection, id).await
    }

    async fn get_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> StoreResult<Vec<Document>> {
        (**self)
            .get_query(collection, statement)
            .await
    }

    async fn set_query(
        &self,
        collection: &str,
        statement: Statement,
        data: Document,
    ) -> StoreResult<usize> {
        (**self)
            .set_query(collection, statement, data)
            .await
    }

    async fn update_query(
        &self,
        collection: &str,
        statement: Statement,
        updates: Update,
    ) -> StoreResult<usize> {
        (**self)
            .update_query(collection, statement, updates)
            .await
    }

    async fn delete_query(&self, collection: &str, statement: Statement) -> StoreResult<usize> {
        (**self)
            .delete_query(collection, statement)
            .await
    }

    fn watch_item(&self, collection: &str, id: &str) -> BoxStream<'static, Option<Document>> {
        (**self).watch_item(collection, id)
    }

    fn watch_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> BoxStream<'static, Vec<Document>> {
        (**self).watch_query(collection, statement)
    }

    async fn shutdown(&self) -> StoreResult<()> {
        (**self).shutdown().await
    }
}

/// Factory trait for constructing provider instances.
#[async_trait]
pub trait ProviderBuilder {
    type Provider: Provider;

    async fn build(self) -> StoreResult<Self::Provider>;
}
