//! Configuration for the distributed cache tier.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Redis configuration for the shared cache tier.
///
/// Every field carries a serde default, so a deployment that only wants the
/// local tier can omit the whole section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable the shared tier (the system gracefully degrades without it).
    /// Default: false, for single-instance deployments.
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Connection URLs for every node of the topology
    /// (e.g., `"redis://cache-1:6379"`). The first node is the command
    /// endpoint for data operations; cluster-wide operations enumerate all
    /// of them.
    #[serde(default = "default_redis_nodes")]
    pub nodes: Vec<String>,

    /// Connection pool size per node.
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Pool wait/create/recycle timeout in milliseconds, so a stalled
    /// connection attempt cannot hold a caller indefinitely.
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,

    /// Default entry TTL, as a positive number of minutes.
    #[serde(default = "default_ttl_minutes")]
    pub default_ttl_minutes: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_nodes() -> Vec<String> {
    vec!["redis://localhost:6379".to_string()]
}

fn default_redis_pool_size() -> usize {
    16
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

fn default_ttl_minutes() -> u64 {
    60
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            nodes: default_redis_nodes(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
            default_ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl RedisConfig {
    /// The configured default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_minutes * 60)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("redis.nodes must list at least one node".into());
        }
        if self.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.timeout_ms == 0 {
            return Err("redis.timeout_ms must be > 0".into());
        }
        if self.default_ttl_minutes == 0 {
            return Err("redis.default_ttl_minutes must be > 0".into());
        }
        Ok(())
    }
}
