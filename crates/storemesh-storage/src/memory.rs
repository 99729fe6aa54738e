//! In-memory repository backend.
//!
//! Used by tests and single-process deployments that do not need a document
//! store. Backed by a `DashMap`, so it is safe for concurrent use without
//! external locking.

use async_trait::async_trait;
use dashmap::DashMap;
use storemesh_core::Store;

use crate::error::StorageError;
use crate::traits::StoreRepository;

/// DashMap-backed [`StoreRepository`].
#[derive(Default)]
pub struct MemoryStoreRepository {
    stores: DashMap<String, Store>,
}

impl MemoryStoreRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with the given stores.
    pub fn with_stores(stores: impl IntoIterator<Item = Store>) -> Self {
        let repo = Self::new();
        for store in stores {
            repo.stores.insert(store.id.clone(), store);
        }
        repo
    }

    /// Number of stores currently held.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether the repository holds no stores.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[async_trait]
impl StoreRepository for MemoryStoreRepository {
    async fn find_all(&self) -> Result<Vec<Store>, StorageError> {
        Ok(self
            .stores
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Store>, StorageError> {
        Ok(self.stores.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, store: &Store) -> Result<(), StorageError> {
        if self.stores.contains_key(&store.id) {
            return Err(StorageError::internal(format!(
                "store already exists: {}",
                store.id
            )));
        }
        self.stores.insert(store.id.clone(), store.clone());
        Ok(())
    }

    async fn update(&self, store: &Store) -> Result<(), StorageError> {
        if !self.stores.contains_key(&store.id) {
            return Err(StorageError::not_found(&store.id));
        }
        self.stores.insert(store.id.clone(), store.clone());
        Ok(())
    }

    async fn delete(&self, store: &Store) -> Result<(), StorageError> {
        self.stores
            .remove(&store.id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(&store.id))
    }
}
