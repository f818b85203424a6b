//! Error types and result types for data store operations.
//!
//! This module provides error handling for all store operations.
//! Use [`StoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a data store.
///
/// The in-memory engine raises only [`StoreError::ItemRequired`]; "absent" is
/// otherwise a meaningful result rather than an error. The remaining
/// variants exist for provider implementations: typed record conversion
/// produces [`StoreError::Serialization`], while providers wrapping
/// external backends convert connection and I/O failures into
/// [`StoreError::Initialization`], [`StoreError::InvalidStatement`], and
/// [`StoreError::Backend`] before returning to callers.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between record formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during provider initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An update targeted an item that does not exist. Updates never create;
    /// recover by falling back to `add_item`/`set_item`.
    /// The first argument is the item id, the second is the collection name.
    #[error("Update requires existing item {0} in collection {1}")]
    ItemRequired(String, String),
    /// A query statement was structurally invalid.
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
    /// An error occurred in the underlying storage provider.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for data store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
