//! Typed record traits for call-site schemas.
//!
//! The storage core works on a single concrete structured-value type
//! (`bson::Document`). Strong per-collection typing lives at the call site:
//! implement [`Record`] for a serde type and use
//! [`TypedCollection`](crate::collection::TypedCollection) to read and write
//! it without handling raw documents.

use bson::{
    Document,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::StoreResult;

/// Trait implemented by typed records stored in a collection.
///
/// # Example
///
/// ```ignore
/// use datakit_core::record::Record;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Record for User {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Record: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns this record's unique string identifier.
    fn id(&self) -> &str;

    /// Returns the name of the collection this record belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users").
    /// The collection is created automatically on first access.
    fn collection_name() -> &'static str;
}

/// Extension trait providing serialization utilities for records.
///
/// Automatically implemented for all [`Record`] types.
pub trait RecordExt: Record {
    /// Converts this record to a BSON document for storage.
    fn to_document(&self) -> StoreResult<Document>;

    /// Creates a record from a stored BSON document.
    fn from_document(document: Document) -> StoreResult<Self>;

    /// Converts this record to a JSON value.
    fn to_json(&self) -> StoreResult<Value>;

    /// Creates a record from a JSON value.
    fn from_json(value: Value) -> StoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_document(&self) -> StoreResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> StoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(from_value(value)?)
    }
}
