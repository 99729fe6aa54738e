//! Distributed (shared) cache tier backed by Redis.
//!
//! One long-lived connection pool per configured node, established once and
//! reused by every caller; the pools are safe for concurrent use without
//! external synchronization. Data commands target the first node (the
//! command endpoint of the topology); `remove_by_pattern` and `clear`
//! enumerate every node, since keys may live anywhere in a sharded setup.
//!
//! Writes default to fire-and-forget: the call returns before the server
//! acknowledges, trading durability for latency. A write can be lost if the
//! node fails right after the call, and no read-after-write consistency is
//! promised by this tier. Callers that need the acknowledgment use
//! [`WriteMode::Acknowledged`] through [`RedisCache::set_with`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::error::CacheError;
use crate::inflight::InflightRegistry;
use crate::tier::{CacheTier, PopulateFuture};

/// Keys fetched per SCAN round during pattern removal.
const SCAN_BATCH: usize = 250;

/// Durability mode for distributed writes, chosen per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Spawn the write and return immediately. At-most-once delivery.
    FireAndForget,
    /// Await the server reply; connectivity failures surface to the caller.
    Acknowledged,
}

struct RedisNode {
    url: String,
    pool: Pool,
}

/// Shared cache tier over a multi-node Redis topology.
pub struct RedisCache {
    nodes: Vec<RedisNode>,
    inflight: InflightRegistry,
    default_ttl: Duration,
}

impl RedisCache {
    /// Build pools for every configured node and verify the command
    /// endpoint is reachable.
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        config.validate().map_err(CacheError::config)?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let mut nodes = Vec::with_capacity(config.nodes.len());
        for url in &config.nodes {
            let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
            pool_config.timeouts.wait = Some(timeout);
            pool_config.timeouts.create = Some(timeout);
            pool_config.timeouts.recycle = Some(timeout);

            let mut redis_config = deadpool_redis::Config::from_url(url);
            redis_config.pool = Some(pool_config);

            let pool = redis_config
                .create_pool(Some(Runtime::Tokio1))
                .map_err(|e| CacheError::connectivity(format!("{url}: {e}")))?;
            nodes.push(RedisNode {
                url: url.clone(),
                pool,
            });
        }

        let cache = Self {
            nodes,
            inflight: InflightRegistry::new(),
            default_ttl: config.default_ttl(),
        };

        // Fail fast when the command endpoint is down so the factory can
        // fall back to a local-only registry.
        cache.connection(cache.command_node()).await?;
        tracing::info!(
            nodes = cache.nodes.len(),
            endpoint = %cache.command_node().url,
            "connected to the shared cache tier"
        );
        Ok(cache)
    }

    /// Whether the command endpoint currently accepts connections.
    pub async fn ping(&self) -> bool {
        self.connection(self.command_node()).await.is_ok()
    }

    /// Write with an explicit durability mode.
    ///
    /// Shared entries always expire: an unspecified TTL takes the configured
    /// default rather than living forever.
    pub async fn set_with(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
        mode: WriteMode,
    ) -> Result<(), CacheError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let pool = self.command_node().pool.clone();
        match mode {
            WriteMode::Acknowledged => write(pool, key.to_string(), value, ttl).await,
            WriteMode::FireAndForget => {
                let key = key.to_string();
                tokio::spawn(async move {
                    if let Err(error) = write(pool, key.clone(), value, ttl).await {
                        tracing::warn!(key = %key, %error, "fire-and-forget cache write lost");
                    }
                });
                Ok(())
            }
        }
    }

    fn command_node(&self) -> &RedisNode {
        // Config validation guarantees at least one node.
        &self.nodes[0]
    }

    async fn connection(&self, node: &RedisNode) -> Result<deadpool_redis::Connection, CacheError> {
        node.pool
            .get()
            .await
            .map_err(|e| CacheError::connectivity(format!("{}: {e}", node.url)))
    }

    /// Enumerate the keys on one node whose text contains `pattern`.
    ///
    /// An O(total keys on that node) cursor walk; expensive by nature and
    /// only used by the invalidation paths.
    async fn scan_node(&self, node: &RedisNode, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection(node).await?;
        let match_expr = format!("*{pattern}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&match_expr)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::connectivity(format!("{}: {e}", node.url)))?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    async fn remove_keys(&self, node: &RedisNode, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection(node).await?;
        conn.del::<_, u64>(keys)
            .await
            .map_err(|e| CacheError::connectivity(format!("{}: {e}", node.url)))
    }

    async fn flush_node(&self, node: &RedisNode) -> Result<(), CacheError> {
        let mut conn = self.connection(node).await?;
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::connectivity(format!("{}: {e}", node.url)))
    }

    /// Fold per-node outcomes into the contract's result: all good, all
    /// down, or a partial failure the caller must know about.
    fn cluster_outcome(&self, failures: usize, first_error: Option<CacheError>) -> Result<(), CacheError> {
        let total = self.nodes.len();
        match failures {
            0 => Ok(()),
            n if n == total => {
                Err(first_error.unwrap_or_else(|| CacheError::connectivity("all cache nodes failed")))
            }
            n => Err(CacheError::PartialInvalidation {
                cleared: total - n,
                total,
            }),
        }
    }
}

async fn write(
    pool: Pool,
    key: String,
    value: Vec<u8>,
    ttl: Duration,
) -> Result<(), CacheError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| CacheError::connectivity(e.to_string()))?;
    conn.set_ex::<_, _, ()>(&key, value.as_slice(), ttl.as_secs().max(1))
        .await
        .map_err(|e| CacheError::connectivity(e.to_string()))?;
    tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "shared tier write");
    Ok(())
}

#[async_trait]
impl CacheTier for RedisCache {
    /// A connectivity failure or an empty reply is a miss; the caller falls
    /// through to the source of truth.
    async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let mut conn = match self.connection(self.command_node()).await {
            Ok(conn) => conn,
            Err(error) => {
                tracing::warn!(key = %key, %error, "shared tier read degraded to a miss");
                return None;
            }
        };
        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(Some(data)) => {
                tracing::debug!(key = %key, "shared tier hit");
                Some(Arc::new(data))
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(key = %key, %error, "shared tier read degraded to a miss");
                None
            }
        }
    }

    async fn get_or_populate(
        &self,
        key: &str,
        factory: PopulateFuture<'_>,
        ttl: Option<Duration>,
    ) -> Result<Arc<Vec<u8>>, CacheError> {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let slot = self.inflight.slot(key);
        let _guard = slot.lock().await;

        if let Some(hit) = self.get(key).await {
            self.inflight.release(key, &slot);
            return Ok(hit);
        }

        let result = factory.await;
        let outcome = match result {
            Ok(bytes) => {
                let data = Arc::new(bytes);
                // Acknowledged write, so waiters parked on the slot observe
                // the populated value. A write failure is not fatal: the
                // value exists, the tier just could not retain it.
                if let Err(error) = self
                    .set_with(key, data.as_ref().clone(), ttl, WriteMode::Acknowledged)
                    .await
                {
                    tracing::warn!(key = %key, %error, "populated value not retained by shared tier");
                }
                Ok(data)
            }
            Err(error) => Err(error),
        };
        self.inflight.release(key, &slot);
        outcome
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        // Contract-level writes are fire-and-forget; `set_with` only fails
        // in acknowledged mode.
        let _ = self.set_with(key, value, ttl, WriteMode::FireAndForget).await;
    }

    async fn remove(&self, key: &str) {
        match self.connection(self.command_node()).await {
            Ok(mut conn) => {
                if let Err(error) = conn.del::<_, ()>(key).await {
                    tracing::warn!(key = %key, %error, "shared tier remove failed");
                }
            }
            Err(error) => {
                tracing::warn!(key = %key, %error, "shared tier remove failed");
            }
        }
    }

    /// SCAN + DEL on every node. Not atomic across nodes: a mid-iteration
    /// failure leaves matched keys on the remaining nodes, reported as
    /// [`CacheError::PartialInvalidation`]. Safe to retry.
    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        let mut failures = 0usize;
        let mut first_error = None;
        for node in &self.nodes {
            let outcome = match self.scan_node(node, pattern).await {
                Ok(keys) => self.remove_keys(node, &keys).await,
                Err(error) => Err(error),
            };
            match outcome {
                Ok(count) => removed += count,
                Err(error) => {
                    tracing::warn!(node = %node.url, pattern = %pattern, %error, "pattern removal failed on node");
                    failures += 1;
                    first_error.get_or_insert(error);
                }
            }
        }
        self.cluster_outcome(failures, first_error)?;
        tracing::debug!(pattern = %pattern, removed, "pattern removal on shared tier");
        Ok(removed)
    }

    /// FLUSHDB on every node, best effort: a partial failure leaves a mix
    /// of cleared and uncleared nodes and surfaces as
    /// [`CacheError::PartialInvalidation`]. Safe to retry.
    async fn clear(&self) -> Result<(), CacheError> {
        let mut failures = 0usize;
        let mut first_error = None;
        for node in &self.nodes {
            if let Err(error) = self.flush_node(node).await {
                tracing::warn!(node = %node.url, %error, "flush failed on node");
                failures += 1;
                first_error.get_or_insert(error);
            }
        }
        self.cluster_outcome(failures, first_error)
    }

    async fn exists(&self, key: &str) -> bool {
        let Ok(mut conn) = self.connection(self.command_node()).await else {
            return false;
        };
        conn.exists::<_, bool>(key).await.unwrap_or(false)
    }
}
