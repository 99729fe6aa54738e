//! Local (process-scoped) cache tier.
//!
//! Backed by a `DashMap`; no network I/O and no serialization beyond the
//! byte payloads the contract carries. TTL is honored lazily on access plus
//! an optional background sweep. Capacity is unbounded by design: TTL and
//! explicit invalidation are the only reclamation paths.
//!
//! Expiry deadlines use `tokio::time::Instant`, so tests can drive a
//! simulated clock with `start_paused` and `tokio::time::advance`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::CacheError;
use crate::inflight::InflightRegistry;
use crate::tier::{CacheTier, PopulateFuture};

/// A cached entry with an optional expiry deadline.
///
/// `None` means the entry lives until explicit removal or process restart.
#[derive(Clone, Debug)]
struct CachedEntry {
    data: Arc<Vec<u8>>,
    expires_at: Option<Instant>,
}

impl CachedEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data: Arc::new(data),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= Instant::now())
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of entries currently in the tier.
    pub entries: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries reclaimed because their TTL elapsed.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// In-process cache tier, scoped to one running instance.
///
/// A fleet of N instances has N independent local tiers; the shared state
/// lives in the distributed tier.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedEntry>,
    inflight: InflightRegistry,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCache {
    /// Create an empty local tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a local tier wrapped in an `Arc` for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of entries currently held, expired ones included until they
    /// are purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tier holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reclaim expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Spawn a background task that purges expired entries every `period`.
    ///
    /// Lazy expiry on access keeps reads correct without the sweeper; the
    /// sweep only reclaims memory for keys nobody touches again.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "reclaimed expired local cache entries");
                }
            }
        })
    }

    /// Snapshot of the tier's counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(&entry.data));
            }
            drop(entry);
            self.entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }
}

#[async_trait]
impl CacheTier for MemoryCache {
    async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.lookup(key)
    }

    async fn get_or_populate(
        &self,
        key: &str,
        factory: PopulateFuture<'_>,
        ttl: Option<Duration>,
    ) -> Result<Arc<Vec<u8>>, CacheError> {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }

        let slot = self.inflight.slot(key);
        let _guard = slot.lock().await;

        // Re-check under the lock: a concurrent caller may have populated
        // the key while this one waited.
        if let Some(hit) = self.lookup(key) {
            self.inflight.release(key, &slot);
            return Ok(hit);
        }

        let result = factory.await;
        let outcome = match result {
            Ok(bytes) => {
                let entry = CachedEntry::new(bytes, ttl);
                let data = Arc::clone(&entry.data);
                self.entries.insert(key.to_string(), entry);
                Ok(data)
            }
            Err(error) => Err(error),
        };
        self.inflight.release(key, &slot);
        outcome
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        self.entries.insert(key.to_string(), CachedEntry::new(value, ttl));
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        self.entries.retain(|key, _| {
            if key.contains(pattern) {
                removed += 1;
                false
            } else {
                true
            }
        });
        tracing::debug!(pattern = %pattern, removed, "pattern removal on local tier");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        tracing::debug!("local tier cleared");
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn payload(text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn get_unset_key_is_a_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("never.set").await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = MemoryCache::new();
        cache.set("ns.stores.id-1", payload("v"), None).await;
        assert_eq!(*cache.get("ns.stores.id-1").await.unwrap(), payload("v"));
        assert!(cache.exists("ns.stores.id-1").await);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("ns.stores.id-5", payload("StoreX"), Some(Duration::from_secs(10 * 60)))
            .await;
        assert!(cache.get("ns.stores.id-5").await.is_some());

        tokio::time::advance(Duration::from_secs(11 * 60)).await;

        assert!(cache.get("ns.stores.id-5").await.is_none());
        assert!(!cache.exists("ns.stores.id-5").await);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_without_ttl_never_expire() {
        let cache = MemoryCache::new();
        cache.set("ns.stores.all", payload("[]"), None).await;
        tokio::time::advance(Duration::from_secs(30 * 24 * 3600)).await;
        assert!(cache.get("ns.stores.all").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_reclaims_expired_entries() {
        let cache = MemoryCache::shared();
        cache.set("a", payload("1"), Some(Duration::from_secs(30))).await;
        cache.set("b", payload("2"), Some(Duration::from_secs(30))).await;
        cache.set("c", payload("3"), None).await;

        let sweeper = cache.spawn_sweeper(Duration::from_secs(60));
        // Let the sweeper task start its interval before moving the clock.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 2);
        sweeper.abort();
    }

    #[tokio::test]
    async fn remove_by_pattern_is_substring_scoped() {
        let cache = MemoryCache::new();
        cache.set("ns.stores.id-5", payload("a"), None).await;
        cache.set("ns.stores.id-50", payload("b"), None).await;
        cache.set("ns.stores.id-7", payload("c"), None).await;
        cache.set("ns.stores.all", payload("d"), None).await;

        let removed = cache.remove_by_pattern("id-5").await.unwrap();
        assert_eq!(removed, 2);
        assert!(cache.get("ns.stores.id-5").await.is_none());
        assert!(cache.get("ns.stores.id-50").await.is_none());
        assert!(cache.get("ns.stores.id-7").await.is_some());
        assert!(cache.get("ns.stores.all").await.is_some());

        // Idempotent: nothing left to match.
        assert_eq!(cache.remove_by_pattern("id-5").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_empties_the_tier() {
        let cache = MemoryCache::new();
        for i in 0..5 {
            cache.set(&format!("ns.stores.id-{i}"), payload("v"), None).await;
        }
        cache.clear().await.unwrap();
        assert!(cache.is_empty());
        for i in 0..5 {
            assert!(cache.get(&format!("ns.stores.id-{i}")).await.is_none());
        }
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set("k", payload("v"), None).await;
        cache.remove("k").await;
        cache.remove("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_populate_runs_factory_once() {
        let cache = MemoryCache::shared();
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_populate(
                        "ns.stores.all",
                        Box::pin(async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Hold the population open so every task piles
                            // onto the same cycle.
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(b"populated".to_vec())
                        }),
                        None,
                    )
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            let value = handle.await.unwrap();
            assert_eq!(*value, b"populated".to_vec());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_population_releases_the_key() {
        let cache = MemoryCache::new();
        let err = cache
            .get_or_populate(
                "k",
                Box::pin(async { Err(CacheError::connectivity("backend down")) }),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Connectivity { .. }));

        // The failure tore the in-flight slot down; the next cycle runs.
        let value = cache
            .get_or_populate("k", Box::pin(async { Ok(b"second".to_vec()) }), None)
            .await
            .unwrap();
        assert_eq!(*value, b"second".to_vec());
    }
}
