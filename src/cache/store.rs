//! In-process cache storage.
//!
//! Status and count entries with per-entry expiry on top of LRU capacity
//! limits. Lock poisoning is recovered, not propagated.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;

use crate::domain::TargetRef;

use super::config::CacheConfig;
use super::contract::{CacheError, CacheLookup, CounterCache};
use super::keys::{CountKey, StatusKey};
use super::lock::{rw_read, rw_write};

pub const METRIC_STATUS_EVICT: &str = "kudos_cache_status_evict_total";
pub const METRIC_COUNT_EVICT: &str = "kudos_cache_count_evict_total";

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, Copy)]
struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Copy> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn live(&self) -> Option<T> {
        (Instant::now() < self.expires_at).then_some(self.value)
    }
}

/// In-process implementation of [`CounterCache`].
///
/// An expired entry is dropped on first access and reported as a miss; it is
/// never served as a default value.
pub struct MemoryCounterCache {
    statuses: RwLock<LruCache<StatusKey, Expiring<bool>>>,
    counts: RwLock<LruCache<CountKey, Expiring<i64>>>,
}

impl MemoryCounterCache {
    /// Create a new cache with the given capacity limits.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            statuses: RwLock::new(LruCache::new(config.status_limit_non_zero())),
            counts: RwLock::new(LruCache::new(config.count_limit_non_zero())),
        }
    }

    fn live_status(&self, key: &StatusKey, op: &'static str) -> Option<bool> {
        let mut guard = rw_write(&self.statuses, SOURCE, op);
        match guard.get(key).map(Expiring::live) {
            Some(Some(value)) => Some(value),
            Some(None) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    fn live_count(&self, key: &CountKey, op: &'static str) -> Option<i64> {
        let mut guard = rw_write(&self.counts, SOURCE, op);
        match guard.get(key).map(Expiring::live) {
            Some(Some(value)) => Some(value),
            Some(None) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    /// Drop every expired entry.
    ///
    /// LRU pressure already evicts cold entries; this sweep keeps long-lived
    /// low-traffic processes from holding dead entries until eviction.
    pub fn purge_expired(&self) {
        let now = Instant::now();

        let mut statuses = rw_write(&self.statuses, SOURCE, "purge_expired.statuses");
        let dead: Vec<StatusKey> = statuses
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in dead {
            statuses.pop(&key);
        }
        drop(statuses);

        let mut counts = rw_write(&self.counts, SOURCE, "purge_expired.counts");
        let dead: Vec<CountKey> = counts
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in dead {
            counts.pop(&key);
        }
    }

    /// Clear all cached data.
    pub fn clear(&self) {
        rw_write(&self.statuses, SOURCE, "clear.statuses").clear();
        rw_write(&self.counts, SOURCE, "clear.counts").clear();
    }

    /// Number of held status entries, live or not.
    pub fn status_len(&self) -> usize {
        rw_read(&self.statuses, SOURCE, "status_len").len()
    }

    /// Number of held count entries, live or not.
    pub fn count_len(&self) -> usize {
        rw_read(&self.counts, SOURCE, "count_len").len()
    }
}

#[async_trait]
impl CounterCache for MemoryCounterCache {
    async fn status(&self, key: &StatusKey) -> Result<Option<bool>, CacheError> {
        Ok(self.live_status(key, "status"))
    }

    async fn set_status(
        &self,
        key: StatusKey,
        value: bool,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = Expiring::new(value, ttl);
        let mut guard = rw_write(&self.statuses, SOURCE, "set_status");
        if let Some((evicted, _)) = guard.push(key.clone(), entry)
            && evicted != key
        {
            counter!(METRIC_STATUS_EVICT).increment(1);
        }
        Ok(())
    }

    async fn del_status(&self, key: &StatusKey) -> Result<(), CacheError> {
        rw_write(&self.statuses, SOURCE, "del_status").pop(key);
        Ok(())
    }

    async fn count(&self, key: &CountKey) -> Result<Option<i64>, CacheError> {
        Ok(self.live_count(key, "count"))
    }

    async fn set_count(
        &self,
        key: CountKey,
        value: i64,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = Expiring::new(value, ttl);
        let mut guard = rw_write(&self.counts, SOURCE, "set_count");
        if let Some((evicted, _)) = guard.push(key.clone(), entry)
            && evicted != key
        {
            counter!(METRIC_COUNT_EVICT).increment(1);
        }
        Ok(())
    }

    async fn incr_count(&self, key: &CountKey, delta: i64) -> Result<bool, CacheError> {
        let mut guard = rw_write(&self.counts, SOURCE, "incr_count");
        match guard.get_mut(key) {
            Some(entry) if entry.live().is_some() => {
                entry.value = entry.value.saturating_add(delta);
                Ok(true)
            }
            Some(_) => {
                guard.pop(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn del_count(&self, key: &CountKey) -> Result<(), CacheError> {
        rw_write(&self.counts, SOURCE, "del_count").pop(key);
        Ok(())
    }

    async fn batch_status(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<CacheLookup<bool>, CacheError> {
        // One lock acquisition so each key's classification comes from a
        // single pass, not interleaved with concurrent writes.
        let mut guard = rw_write(&self.statuses, SOURCE, "batch_status");
        let mut lookup = CacheLookup::default();
        for target in targets {
            let key = StatusKey::new(user_id, target.clone());
            match guard.get(&key).map(Expiring::live) {
                Some(Some(value)) => {
                    lookup.hits.insert(target.clone(), value);
                }
                Some(None) => {
                    guard.pop(&key);
                    lookup.misses.push(target.clone());
                }
                None => lookup.misses.push(target.clone()),
            }
        }
        Ok(lookup)
    }

    async fn batch_count(&self, targets: &[TargetRef]) -> Result<CacheLookup<i64>, CacheError> {
        let mut guard = rw_write(&self.counts, SOURCE, "batch_count");
        let mut lookup = CacheLookup::default();
        for target in targets {
            let key = CountKey::new(target.clone());
            match guard.get(&key).map(Expiring::live) {
                Some(Some(value)) => {
                    lookup.hits.insert(target.clone(), value);
                }
                Some(None) => {
                    guard.pop(&key);
                    lookup.misses.push(target.clone());
                }
                None => lookup.misses.push(target.clone()),
            }
        }
        Ok(lookup)
    }
}
