//! Counter engine: single entry point combining the store and the cache.
//!
//! Reads are cache-first with store fallback; mutations write through to the
//! store first and mirror the confirmed value into the cache afterwards.
//! Cache failures degrade latency, never correctness: they are logged and
//! absorbed here, and the store path answers instead.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::application::repos::{EngagementStore, RepoError};
use crate::cache::{CacheConfig, CacheError, CacheLookup, CountKey, CounterCache, StatusKey};
use crate::domain::engagement::{validate_pair, validate_target};
use crate::domain::{DomainError, TargetRef};

pub const METRIC_STATUS_HIT: &str = "kudos_cache_status_hit_total";
pub const METRIC_STATUS_MISS: &str = "kudos_cache_status_miss_total";
pub const METRIC_COUNT_HIT: &str = "kudos_cache_count_hit_total";
pub const METRIC_COUNT_MISS: &str = "kudos_cache_count_miss_total";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Store(#[from] RepoError),
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Outcome of a toggle: the confirmed flag and the post-toggle aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub active: bool,
    pub count: i64,
}

/// Orchestrates toggle and read operations across store and cache.
///
/// Holds no engine-local mutable state: synchronization is delegated to the
/// store's atomic upsert and the cache's in-place increment. Construct one
/// engine at process start and hand clones to request handlers.
#[derive(Clone)]
pub struct CounterEngine {
    store: Arc<dyn EngagementStore>,
    cache: Arc<dyn CounterCache>,
    config: CacheConfig,
}

impl CounterEngine {
    pub fn new(
        store: Arc<dyn EngagementStore>,
        cache: Arc<dyn CounterCache>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Flip the engagement flag for (user, target).
    ///
    /// The store write is the single point of truth; on store failure the
    /// cache is left untouched and the error propagates. Once the store has
    /// committed, cache trouble no longer fails the operation.
    pub async fn toggle(
        &self,
        user_id: &str,
        target: &TargetRef,
    ) -> Result<ToggleOutcome, EngineError> {
        validate_pair(user_id, target)?;

        let active = self.store.toggle(user_id, target).await?;

        if self.config.enabled {
            let status_key = StatusKey::new(user_id, target.clone());
            let count_key = CountKey::new(target.clone());
            let delta = if active { 1 } else { -1 };

            let (status_write, count_write) = tokio::join!(
                self.cache
                    .set_status(status_key.clone(), active, self.config.status_ttl()),
                // Adjust only an entry that already exists: a key that was
                // never cached has no known baseline.
                self.cache.incr_count(&count_key, delta),
            );
            if let Err(err) = status_write {
                self.note_status_failure("toggle.set_status", &status_key, err)
                    .await;
            }
            if let Err(err) = count_write {
                self.note_count_failure("toggle.incr_count", &count_key, err)
                    .await;
            }
        }

        let count = self.count_inner(target).await?;
        Ok(ToggleOutcome { active, count })
    }

    /// Did this user engage with this target?
    pub async fn status(&self, user_id: &str, target: &TargetRef) -> Result<bool, EngineError> {
        validate_pair(user_id, target)?;

        let key = StatusKey::new(user_id, target.clone());
        if self.config.enabled {
            match self.cache.status(&key).await {
                Ok(Some(value)) => {
                    counter!(METRIC_STATUS_HIT).increment(1);
                    return Ok(value);
                }
                Ok(None) => counter!(METRIC_STATUS_MISS).increment(1),
                Err(err) => {
                    counter!(METRIC_STATUS_MISS).increment(1);
                    self.note_status_failure("status.get", &key, err).await;
                }
            }
        }

        let value = self.store.is_active(user_id, target).await?;

        if self.config.enabled
            && let Err(err) = self
                .cache
                .set_status(key.clone(), value, self.config.status_ttl())
                .await
        {
            self.note_status_failure("status.populate", &key, err).await;
        }

        Ok(value)
    }

    /// How many users engaged with this target?
    pub async fn count(&self, target: &TargetRef) -> Result<i64, EngineError> {
        validate_target(target)?;
        self.count_inner(target).await
    }

    /// Resolve engagement flags for one user over many targets.
    ///
    /// The result carries exactly the requested targets as keys: cache hits,
    /// then one grouped store query for the misses, with targets absent from
    /// both resolved as `false`.
    pub async fn batch_status(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, bool>, EngineError> {
        if user_id.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "user id must not be empty".to_string(),
            ));
        }
        for target in targets {
            validate_target(target)?;
        }
        if targets.is_empty() {
            return Ok(HashMap::new());
        }

        let CacheLookup { mut hits, misses } = self.cache_batch_status(user_id, targets).await;
        counter!(METRIC_STATUS_HIT).increment(hits.len() as u64);
        counter!(METRIC_STATUS_MISS).increment(misses.len() as u64);

        if !misses.is_empty() {
            let resolved = self.store.batch_is_active(user_id, &misses).await?;
            for target in &misses {
                let value = resolved.get(target).copied().unwrap_or(false);
                if self.config.enabled {
                    let key = StatusKey::new(user_id, target.clone());
                    if let Err(err) = self
                        .cache
                        .set_status(key.clone(), value, self.config.status_ttl())
                        .await
                    {
                        self.note_status_failure("batch_status.populate", &key, err)
                            .await;
                    }
                }
                hits.insert(target.clone(), value);
            }
        }

        Ok(hits)
    }

    /// Resolve aggregate counts for many targets, zero-filled.
    pub async fn batch_count(
        &self,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, i64>, EngineError> {
        for target in targets {
            validate_target(target)?;
        }
        if targets.is_empty() {
            return Ok(HashMap::new());
        }

        let CacheLookup { mut hits, misses } = self.cache_batch_count(targets).await;
        counter!(METRIC_COUNT_HIT).increment(hits.len() as u64);
        counter!(METRIC_COUNT_MISS).increment(misses.len() as u64);

        if !misses.is_empty() {
            let resolved = self.store.batch_count_active(&misses).await?;
            for target in &misses {
                let value = resolved.get(target).copied().unwrap_or(0);
                if self.config.enabled {
                    let key = CountKey::new(target.clone());
                    if let Err(err) = self
                        .cache
                        .set_count(key.clone(), value, self.config.count_ttl())
                        .await
                    {
                        self.note_count_failure("batch_count.populate", &key, err)
                            .await;
                    }
                }
                hits.insert(target.clone(), value);
            }
        }

        Ok(hits)
    }

    async fn count_inner(&self, target: &TargetRef) -> Result<i64, EngineError> {
        let key = CountKey::new(target.clone());
        if self.config.enabled {
            match self.cache.count(&key).await {
                Ok(Some(value)) => {
                    counter!(METRIC_COUNT_HIT).increment(1);
                    return Ok(value);
                }
                Ok(None) => counter!(METRIC_COUNT_MISS).increment(1),
                Err(err) => {
                    counter!(METRIC_COUNT_MISS).increment(1);
                    self.note_count_failure("count.get", &key, err).await;
                }
            }
        }

        let value = self.store.count_active(target).await?;

        if self.config.enabled
            && let Err(err) = self
                .cache
                .set_count(key.clone(), value, self.config.count_ttl())
                .await
        {
            self.note_count_failure("count.populate", &key, err).await;
        }

        Ok(value)
    }

    async fn cache_batch_status(&self, user_id: &str, targets: &[TargetRef]) -> CacheLookup<bool> {
        if !self.config.enabled {
            return CacheLookup::all_misses(targets);
        }
        match self.cache.batch_status(user_id, targets).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(
                    error = %err,
                    "bulk status lookup failed; treating every key as a miss"
                );
                CacheLookup::all_misses(targets)
            }
        }
    }

    async fn cache_batch_count(&self, targets: &[TargetRef]) -> CacheLookup<i64> {
        if !self.config.enabled {
            return CacheLookup::all_misses(targets);
        }
        match self.cache.batch_count(targets).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(
                    error = %err,
                    "bulk count lookup failed; treating every key as a miss"
                );
                CacheLookup::all_misses(targets)
            }
        }
    }

    async fn note_status_failure(&self, op: &'static str, key: &StatusKey, err: CacheError) {
        warn!(op, key = %key, error = %err, "cache operation failed; continuing without cache");
        if matches!(err, CacheError::Corrupt { .. })
            && let Err(err) = self.cache.del_status(key).await
        {
            warn!(op, key = %key, error = %err, "failed to drop corrupt cache entry");
        }
    }

    async fn note_count_failure(&self, op: &'static str, key: &CountKey, err: CacheError) {
        warn!(op, key = %key, error = %err, "cache operation failed; continuing without cache");
        if matches!(err, CacheError::Corrupt { .. })
            && let Err(err) = self.cache.del_count(key).await
        {
            warn!(op, key = %key, error = %err, "failed to drop corrupt cache entry");
        }
    }
}
