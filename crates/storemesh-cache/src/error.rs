//! Error types for cache operations.
//!
//! The taxonomy separates transient infrastructure failures (which degrade to
//! cache-miss behavior wherever the repository offers a safe fallback) from
//! failures a caller has to act on, like a partially cleared cluster.

use storemesh_storage::StorageError;

/// Errors that can occur against a cache tier.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A cache node was unreachable or timed out. Transient: reads treat
    /// this as a miss, cluster-wide operations surface it so the caller can
    /// retry.
    #[error("cache node unreachable: {message}")]
    Connectivity {
        /// Description of the connectivity failure.
        message: String,
    },

    /// A payload could not be encoded or decoded. On the read path this is
    /// downgraded to a miss and the poisoned entry is removed; it never
    /// propagates as a hard failure out of a lookup.
    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cluster-wide clear or pattern removal succeeded on some nodes and
    /// failed on others. The operation is idempotent and safe to retry;
    /// until then the uncleared nodes may hold stale entries.
    #[error("invalidation reached {cleared} of {total} cache nodes")]
    PartialInvalidation {
        /// Nodes that were cleared successfully.
        cleared: usize,
        /// Total nodes in the topology.
        total: usize,
    },

    /// The cache configuration is invalid (no nodes, zero TTL, ...).
    #[error("invalid cache configuration: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// A population factory failed against the repository. Carried through
    /// unchanged so the service layer can hand the repository error back to
    /// its caller unmasked.
    #[error(transparent)]
    Repository(#[from] StorageError),
}

impl CacheError {
    /// Creates a new `Connectivity` error.
    #[must_use]
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
