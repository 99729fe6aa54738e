//! Two-tier caching for the store configuration collection.
//!
//! ## Architecture
//!
//! - **Primary tier (DashMap)**: in-process, microsecond latency, scoped to
//!   one running instance
//! - **Secondary tier (Redis)**: shared across instances, TTL-based expiry,
//!   multi-node topology
//!
//! ```text
//! read  → primary tier → (miss) → source of truth → populate primary
//! write → source of truth → clear primary + secondary
//! ```
//!
//! ## Graceful degradation
//!
//! When Redis is disabled or unreachable, [`create_cache_registry`] returns
//! a primary-only registry and the system keeps running on the local tier.
//! Cache entries are strictly derived data; the repository stays the single
//! source of truth, so degradation costs latency, never correctness.

pub mod config;
pub mod error;
mod inflight;
pub mod memory;
pub mod redis;
pub mod registry;
pub mod tier;

pub use config::RedisConfig;
pub use error::CacheError;
pub use memory::{CacheStats, MemoryCache};
pub use redis::{RedisCache, WriteMode};
pub use registry::{CacheRegistry, CacheRole};
pub use tier::{CacheTier, PopulateFuture};

use std::sync::Arc;

/// Build the tier registry for this process.
///
/// The local tier is always the primary. When the config enables Redis and
/// the command endpoint answers, the shared tier is registered as the
/// secondary; otherwise the registry degrades to primary-only and the
/// reason is logged.
pub async fn create_cache_registry(config: &RedisConfig) -> CacheRegistry {
    let registry = CacheRegistry::new(MemoryCache::shared());

    if !config.enabled {
        tracing::info!("shared cache tier disabled, running on the local tier only");
        return registry;
    }

    match RedisCache::connect(config).await {
        Ok(redis) => registry.register(CacheRole::Secondary, Arc::new(redis)),
        Err(error) => {
            tracing::warn!(%error, "shared cache tier unavailable, falling back to the local tier only");
            registry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_config_yields_primary_only() {
        let config = RedisConfig::default();
        assert!(!config.enabled);
        let registry = create_cache_registry(&config).await;
        assert!(registry.secondary().is_none());
    }

    #[tokio::test]
    async fn unreachable_redis_degrades_to_primary_only() {
        let config = RedisConfig {
            enabled: true,
            nodes: vec!["redis://127.0.0.1:1".to_string()],
            timeout_ms: 200,
            ..RedisConfig::default()
        };
        let registry = create_cache_registry(&config).await;
        assert!(registry.secondary().is_none());

        // Still a working cache.
        registry.primary().set("k", b"v".to_vec(), None).await;
        assert!(registry.primary().get("k").await.is_some());
    }
}
