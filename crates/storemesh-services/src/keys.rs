//! Cache key scheme for the store collection.
//!
//! Keys follow `"<namespace>.<collection>.<selector>"`. The namespace is
//! fixed per deployment; keeping every key under it prevents collisions
//! with other collections sharing the same tiers and gives pattern-based
//! eviction a conventional scope to aim at.

/// Default key namespace.
pub const DEFAULT_NAMESPACE: &str = "storemesh";

/// Key builder for the store collection.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    /// Key scheme under the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The fixed key caching the full, ordered collection.
    pub fn all(&self) -> String {
        format!("{}.stores.all", self.namespace)
    }

    /// The key caching a single store by id.
    pub fn by_id(&self, id: &str) -> String {
        format!("{}.stores.id-{id}", self.namespace)
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
