//! Error types for the store service.

use storemesh_cache::CacheError;
use storemesh_storage::StorageError;

/// Errors the store service surfaces to its callers.
#[derive(Debug, thiserror::Error)]
pub enum StoresError {
    /// The collection must never become empty: deleting the only configured
    /// store is rejected before any mutation happens.
    #[error("cannot delete the only configured store")]
    LastStore,

    /// A repository failure, propagated unchanged. The cache never masks
    /// these.
    #[error(transparent)]
    Repository(#[from] StorageError),

    /// The repository write committed, but clearing the cache tiers failed
    /// afterwards. Stale reads are possible until a retried invalidation
    /// succeeds; the mutation itself stands.
    #[error("mutation committed but cache invalidation failed: {source}")]
    Invalidation {
        /// The underlying tier failure.
        #[source]
        source: CacheError,
    },

    /// A cache failure on the read path that had no repository fallback.
    #[error(transparent)]
    Cache(CacheError),
}
