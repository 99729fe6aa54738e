//! The repository trait all store backends implement.

use async_trait::async_trait;
use storemesh_core::Store;

use crate::error::StorageError;

/// Persistence contract for the store collection.
///
/// Implementations must be thread-safe (`Send + Sync`); every method may hit
/// the network. The service layer wraps this behind the cache tiers, so a
/// backend does not need to do any caching of its own.
///
/// # Example
///
/// ```ignore
/// use storemesh_storage::{StoreRepository, StorageError};
///
/// async fn require_store(
///     repo: &dyn StoreRepository,
///     id: &str,
/// ) -> Result<storemesh_core::Store, StorageError> {
///     repo.find_by_id(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Returns every store, in whatever order the backend yields them.
    ///
    /// Ordering by `display_order` is the service layer's job.
    async fn find_all(&self) -> Result<Vec<Store>, StorageError>;

    /// Fetches a single store by id.
    ///
    /// Returns `Ok(None)` when the store does not exist; errors are reserved
    /// for infrastructure failures.
    async fn find_by_id(&self, id: &str) -> Result<Option<Store>, StorageError>;

    /// Inserts a new store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Internal` if a store with the same id exists.
    async fn insert(&self, store: &Store) -> Result<(), StorageError>;

    /// Updates an existing store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the store does not exist.
    async fn update(&self, store: &Store) -> Result<(), StorageError>;

    /// Deletes a store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the store does not exist.
    async fn delete(&self, store: &Store) -> Result<(), StorageError>;
}
