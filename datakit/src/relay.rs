//! A delegation provider with a swappable target.

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use mea::rwlock::RwLock;

use datakit_core::{
    error::StoreResult,
    provider::Provider,
    statement::Statement,
    update::Update,
};

/// Decorating provider that forwards every operation to its current
/// target.
///
/// The target can be swapped at runtime with [`RelayProvider::set_target`],
/// so callers holding the relay transparently move to a different backend.
/// Calls in flight finish against the target they resolved; subscription
/// streams keep following the target they were opened against.
#[derive(Debug, Clone)]
pub struct RelayProvider {
    target: Arc<RwLock<Arc<dyn Provider>>>,
}

impl RelayProvider {
    /// Creates a relay forwarding to the given target.
    pub fn new(target: Arc<dyn Provider>) -> Self {
        Self { target: Arc::new(RwLock::new(target)) }
    }

    /// Swaps the forwarding target.
    pub async fn set_target(&self, target: Arc<dyn Provider>) {
        *self.target.write().await = target;
    }

    /// The current forwarding target.
    pub async fn target(&self) -> Arc<dyn Provider> {
        self.target.read().await.clone()
    }
}

#[async_trait]
impl Provider for RelayProvider {
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.target()
            .await
            .get_item(collection, id)
            .await
    }

    async fn add_item(&self, collection: &str, data: Document) -> StoreResult<String> {
        self.target()
            .await
            .add_item(collection, data)
            .await
    }

    async fn set_item(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.target()
            .await
            .set_item(collection, id, data)
            .await
    }

    async fn update_item(&self, collection: &str, id: &str, updates: Update) -> StoreResult<()> {
        self.target()
            .await
            .update_item(collection, id, updates)
            .await
    }

    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.target()
            .await
            .delete_item(collection, id)
            .await
    }

    async fn get_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> StoreResult<Vec<Document>> {
        self.target()
            .await
            .get_query(collection, statement)
            .await
    }

    async fn set_query(
        &self,
        collection: &str,
        statement: Statement,
        data: Document,
    ) -> StoreResult<usize> {
        self.target()
            .await
            .set_query(collection, statement, data)
            .await
    }

    async fn update_query(
        &self,
        collection: &str,
        statement: Statement,
        updates: Update,
    ) -> StoreResult<usize> {
        self.target()
            .await
            .update_query(collection, statement, updates)
            .await
    }

    async fn delete_query(&self, collection: &str, statement: Statement) -> StoreResult<usize> {
        self.target()
            .await
            .delete_query(collection, statement)
            .await
    }

    fn watch_item(&self, collection: &str, id: &str) -> BoxStream<'static, Option<Document>> {
        let relay = self.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        stream::once(async move {
            relay
                .target()
                .await
                .watch_item(&collection, &id)
        })
        .flatten()
        .boxed()
    }

    fn watch_query(
        &self,
        collection: &str,
        statement: Statement,
    ) -> BoxStream<'static, Vec<Document>> {
        let relay = self.clone();
        let collection = collection.to_string();

        stream::once(async move {
            relay
                .target()
                .await
                .watch_query(&collection, statement)
        })
        .flatten()
        .boxed()
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.target().await.shutdown().await
    }
}
