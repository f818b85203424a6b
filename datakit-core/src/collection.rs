//! Collection handles bound to a provider and a collection name.
//!
//! A collection handle is the namespaced view of a provider: every method is
//! a one-line delegation to the corresponding provider operation with the
//! collection name filled in.
//!
//! - [`Collection`] - Untyped handle working with explicit BSON documents
//! - [`TypedCollection`] - Type-safe handle for a specific [`Record`] type

use std::marker::PhantomData;

use bson::Document;
use futures::stream::BoxStream;

use crate::{
    error::StoreResult,
    provider::Provider,
    record::{Record, RecordExt},
    statement::Statement,
    update::Update,
};

/// An untyped collection handle with a reference to a provider.
#[derive(Debug)]
pub struct Collection<'a, P: Provider> {
    name: String,
    provider: &'a P,
}

impl<'a, P: Provider> Collection<'a, P> {
    pub(crate) fn new(name: String, provider: &'a P) -> Self {
        Self { name, provider }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point lookup by id; `None` if absent.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        self.provider
            .get_item(&self.name, id)
            .await
    }

    /// Stores `data` under a fresh random id and returns the id.
    pub async fn add(&self, data: Document) -> StoreResult<String> {
        self.provider
            .add_item(&self.name, data)
            .await
    }

    /// Full replace of the item under `id`.
    pub async fn set(&self, id: &str, data: Document) -> StoreResult<()> {
        self.provider
            .set_item(&self.name, id, data)
            .await
    }

    /// Partial update of an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemRequired`](crate::error::StoreError::ItemRequired)
    /// if the id is absent.
    pub async fn update(&self, id: &str, updates: Update) -> StoreResult<()> {
        self.provider
            .update_item(&self.name, id, updates)
            .await
    }

    /// Removes the item if present; a silent no-op otherwise.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.provider
            .delete_item(&self.name, id)
            .await
    }

    /// Evaluates a statement against the collection.
    pub async fn query(&self, statement: Statement) -> StoreResult<Vec<Document>> {
        self.provider
            .get_query(&self.name, statement)
            .await
    }

    /// Replaces every matched record's value with `data`; returns the count.
    pub async fn set_query(&self, statement: Statement, data: Document) -> StoreResult<usize> {
        self.provider
            .set_query(&self.name, statement, data)
            .await
    }

    /// Applies `updates` to every matched record; returns the changed count.
    pub async fn update_query(&self, statement: Statement, updates: Update) -> StoreResult<usize> {
        self.provider
            .update_query(&self.name, statement, updates)
            .await
    }

    /// Removes every matched record; returns the count.
    pub async fn delete_query(&self, statement: Statement) -> StoreResult<usize> {
        self.provider
            .delete_query(&self.name, statement)
            .await
    }

    /// Live stream of an item's value.
    pub fn watch(&self, id: &str) -> BoxStream<'static, Option<Document>> {
        self.provider.watch_item(&self.name, id)
    }

    /// Live stream of a query's result set.
    pub fn watch_query(&self, statement: Statement) -> BoxStream<'static, Vec<Document>> {
        self.provider
            .watch_query(&self.name, statement)
    }
}

/// A type-safe collection handle for a specific [`Record`] type.
///
/// Serialization failures surface as
/// [`StoreError::Serialization`](crate::error::StoreError::Serialization).
#[derive(Debug)]
pub struct TypedCollection<'a, P: Provider, R: Record> {
    name: String,
    provider: &'a P,
    _marker: PhantomData<R>,
}

impl<'a, P: Provider, R: Record> TypedCollection<'a, P, R> {
    pub(crate) fn new(name: String, provider: &'a P) -> Self {
        Self { name, provider, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point lookup by id; `None` if absent.
    pub async fn get(&self, id: &str) -> StoreResult<Option<R>> {
        self.provider
            .get_item(&self.name, id)
            .await?
            .map(R::from_document)
            .transpose()
    }

    /// Stores each record under its own id, replacing any existing value.
    pub async fn insert(&self, records: Vec<R>) -> StoreResult<()> {
        for record in records {
            self.provider
                .set_item(&self.name, record.id(), record.to_document()?)
                .await?;
        }

        Ok(())
    }

    /// Partial update of an existing record.
    pub async fn update(&self, id: &str, updates: Update) -> StoreResult<()> {
        self.provider
            .update_item(&self.name, id, updates)
            .await
    }

    /// Removes the record if present; a silent no-op otherwise.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.provider
            .delete_item(&self.name, id)
            .await
    }

    /// Evaluates a statement and deserializes the matching records.
    pub async fn query(&self, statement: Statement) -> StoreResult<Vec<R>> {
        self.provider
            .get_query(&self.name, statement)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }
}
