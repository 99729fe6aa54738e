//! The cached store service.

use std::sync::Arc;

use storemesh_cache::{CacheError, CacheRegistry};
use storemesh_core::{EventBroadcaster, Store};
use storemesh_storage::StoreRepository;

use crate::error::StoresError;
use crate::keys::CacheKeys;

/// Orchestrates the cache tiers in front of the store repository.
///
/// Reads are served from the primary (local) tier and populated from the
/// repository on a miss, with no TTL: an entry stays valid until a mutation
/// clears it. Mutations write through the repository, clear both tiers in
/// full, and emit a lifecycle event.
pub struct StoreService {
    repository: Arc<dyn StoreRepository>,
    tiers: CacheRegistry,
    events: EventBroadcaster,
    keys: CacheKeys,
}

impl StoreService {
    /// Wire the service to its collaborators, using the default key
    /// namespace.
    pub fn new(
        repository: Arc<dyn StoreRepository>,
        tiers: CacheRegistry,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            repository,
            tiers,
            events,
            keys: CacheKeys::default(),
        }
    }

    /// Override the key namespace for this deployment.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.keys = CacheKeys::new(namespace);
        self
    }

    /// All stores, ordered by `display_order` ascending.
    ///
    /// Cached under the fixed all-stores key with no TTL; the cache entry is
    /// the only memo of the collection, so invalidation has a single path.
    pub async fn get_all(&self) -> Result<Vec<Store>, StoresError> {
        let repository = Arc::clone(&self.repository);
        self.tiers
            .primary()
            .get_or_populate_json(&self.keys.all(), None, move || {
                let repository = Arc::clone(&repository);
                async move {
                    tracing::debug!("populating the store collection from the repository");
                    let mut stores = repository.find_all().await.map_err(CacheError::from)?;
                    stores.sort_by_key(|store| store.display_order);
                    Ok(stores)
                }
            })
            .await
            .map_err(lift)
    }

    /// A single store by id.
    ///
    /// A repository-confirmed absence is cached too (as JSON `null`), so a
    /// cache hit on `None` still means "confirmed not to exist" rather than
    /// "never looked".
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Store>, StoresError> {
        let repository = Arc::clone(&self.repository);
        let id_owned = id.to_string();
        self.tiers
            .primary()
            .get_or_populate_json(&self.keys.by_id(id), None, move || {
                let repository = Arc::clone(&repository);
                let id = id_owned.clone();
                async move {
                    tracing::debug!(store_id = %id, "populating store from the repository");
                    repository.find_by_id(&id).await.map_err(CacheError::from)
                }
            })
            .await
            .map_err(lift)
    }

    /// Insert a store, clear both tiers, emit a created event.
    pub async fn insert(&self, store: &Store) -> Result<(), StoresError> {
        self.repository.insert(store).await?;
        let invalidation = self.invalidate_tiers().await;
        self.events.send_created(store.clone());
        invalidation
    }

    /// Update a store, clear both tiers, emit an updated event.
    pub async fn update(&self, store: &Store) -> Result<(), StoresError> {
        self.repository.update(store).await?;
        let invalidation = self.invalidate_tiers().await;
        self.events.send_updated(store.clone());
        invalidation
    }

    /// Delete a store, clear both tiers, emit a deleted event.
    ///
    /// Rejected before any mutation when the store is the only one
    /// configured: the collection must never become empty.
    pub async fn delete(&self, store: &Store) -> Result<(), StoresError> {
        let all = self.get_all().await?;
        if all.len() == 1 {
            return Err(StoresError::LastStore);
        }

        self.repository.delete(store).await?;
        let invalidation = self.invalidate_tiers().await;
        self.events.send_deleted(store.clone());
        invalidation
    }

    /// Full clear of both tiers, only called after a confirmed repository
    /// write. A failure here does not undo the mutation; it is surfaced so
    /// the caller knows stale reads are possible until a retry succeeds.
    async fn invalidate_tiers(&self) -> Result<(), StoresError> {
        self.tiers
            .clear_all()
            .await
            .map_err(|source| StoresError::Invalidation { source })
    }
}

/// Hand factory failures back as the repository errors they are; everything
/// else is a genuine cache failure.
fn lift(error: CacheError) -> StoresError {
    match error {
        CacheError::Repository(storage) => StoresError::Repository(storage),
        other => StoresError::Cache(other),
    }
}
