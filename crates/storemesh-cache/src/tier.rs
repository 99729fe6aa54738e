//! The cache capability contract shared by both tiers.
//!
//! A [`CacheTier`] stores opaque serialized payloads under namespaced string
//! keys. Keeping the trait byte-level makes it object-safe; typed access for
//! arbitrary serde value shapes (strings, numbers, nested records) lives in
//! the JSON facade implemented on `dyn CacheTier` below.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;

/// A boxed, fallible producer for [`CacheTier::get_or_populate`].
///
/// The future is only polled when the key is absent, so an expensive fetch
/// behind it runs on misses alone.
pub type PopulateFuture<'a> = BoxFuture<'a, Result<Vec<u8>, CacheError>>;

/// Contract implemented by every cache tier.
///
/// Payloads are returned as `Arc<Vec<u8>>` so hits clone a pointer, not the
/// data. All operations tolerate concurrent use without external locking.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Non-destructive lookup. `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>>;

    /// Returns the cached value if present; otherwise runs `factory`,
    /// stores its result under `key` with `ttl`, and returns it.
    ///
    /// Population per key is serialized: under N concurrent misses the
    /// factory runs at most once per population cycle, and the losers
    /// observe the winner's value.
    async fn get_or_populate(
        &self,
        key: &str,
        factory: PopulateFuture<'_>,
        ttl: Option<Duration>,
    ) -> Result<Arc<Vec<u8>>, CacheError>;

    /// Unconditional overwrite. `ttl: None` means "no expiry" for tiers
    /// that support it (the local tier keeps the entry until cleared).
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Removes a key. Idempotent; an absent key is not an error.
    async fn remove(&self, key: &str);

    /// Removes every key containing `pattern` as a substring and returns
    /// how many were removed. Idempotent.
    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Removes all keys this tier manages. Does not touch the other tier.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Existence check without deserialization cost.
    async fn exists(&self, key: &str) -> bool;
}

impl dyn CacheTier {
    /// Typed lookup. A payload that fails to decode is treated as a miss:
    /// the poisoned entry is removed so the next read repopulates from the
    /// source of truth.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(key = %key, %error, "dropping undecodable cache entry");
                self.remove(key).await;
                None
            }
        }
    }

    /// Typed overwrite; the value is stored as JSON text.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl).await;
        Ok(())
    }

    /// Typed read-through. On a miss the factory produces the value, which
    /// is stored as JSON under `key` with `ttl`.
    ///
    /// A cached payload that fails to decode is removed and populated
    /// afresh, so one corrupted entry costs one extra factory run rather
    /// than a hard failure.
    pub async fn get_or_populate_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, CacheError>> + Send,
    {
        let mut retried = false;
        loop {
            let factory = &factory;
            let populate: PopulateFuture<'_> = Box::pin(async move {
                let value = factory().await?;
                Ok(serde_json::to_vec(&value)?)
            });
            let bytes = self.get_or_populate(key, populate, ttl).await?;
            match serde_json::from_slice(&bytes) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    self.remove(key).await;
                    // A fresh population round-trips what the factory just
                    // serialized, so a second failure is a real error.
                    if retried {
                        return Err(CacheError::Serialization(error));
                    }
                    tracing::warn!(key = %key, %error, "repopulating undecodable cache entry");
                    retried = true;
                }
            }
        }
    }
}
