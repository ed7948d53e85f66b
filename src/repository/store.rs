//! Storage gateway contract.
//!
//! A store holds whole [`TodoItem`] documents keyed by `id`. It has no
//! business rules: writes are unconditional upserts (last writer wins) and a
//! missing key is a normal `Ok(None)`, never an error.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::todo::TodoItem;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the call.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be converted to or from a `TodoItem`.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Writes the full item at `item.id`, replacing whatever was there.
    async fn put(&self, item: &TodoItem) -> Result<(), StorageError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StorageError>;

    /// Full scan. Order is whatever the backend returns.
    async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError>;

    /// Removes the item at `id`. Deleting a missing key succeeds.
    async fn delete_by_id(&self, id: &str) -> Result<(), StorageError>;

    async fn delete(&self, item: &TodoItem) -> Result<(), StorageError> {
        self.delete_by_id(&item.id).await
    }
}
