//! Cache-side contract: best-effort acceleration, never authoritative.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TargetRef;

use super::keys::{CountKey, StatusKey};

#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend unreachable or timed out. Callers degrade to treating every
    /// key as a miss; an outage must never fabricate data.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be parsed into its expected type. Treated as
    /// a miss; the entry should be deleted so the next read repopulates it.
    #[error("corrupt cache entry `{key}`")]
    Corrupt { key: String },
}

impl CacheError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn corrupt(key: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            key: key.to_string(),
        }
    }
}

/// Result of one bulk cache pass: resolved hits plus the targets that must
/// be fetched from the store.
///
/// Absent, expired and unparsable entries are misses, never `false` or zero.
/// Every requested target appears in exactly one of the two buckets, and
/// each classification comes from a single pass over the cache.
#[derive(Debug, Default)]
pub struct CacheLookup<T> {
    pub hits: HashMap<TargetRef, T>,
    pub misses: Vec<TargetRef>,
}

impl<T> CacheLookup<T> {
    /// The degraded shape used when the cache backend is unreachable.
    pub fn all_misses(targets: &[TargetRef]) -> Self {
        Self {
            hits: HashMap::new(),
            misses: targets.to_vec(),
        }
    }
}

/// Look-aside cache of engagement flags and aggregate counts.
///
/// Implementations hold no authority over state: the engine writes through
/// to the store first and only then mirrors confirmed values here. TTLs
/// bound how long an out-of-order write-back can survive.
#[async_trait]
pub trait CounterCache: Send + Sync {
    async fn status(&self, key: &StatusKey) -> Result<Option<bool>, CacheError>;

    async fn set_status(
        &self,
        key: StatusKey,
        value: bool,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn del_status(&self, key: &StatusKey) -> Result<(), CacheError>;

    async fn count(&self, key: &CountKey) -> Result<Option<i64>, CacheError>;

    async fn set_count(&self, key: CountKey, value: i64, ttl: Duration)
    -> Result<(), CacheError>;

    /// Adjust an existing count entry in place. Returns `false` when no live
    /// entry was present; a missing baseline is never fabricated.
    async fn incr_count(&self, key: &CountKey, delta: i64) -> Result<bool, CacheError>;

    async fn del_count(&self, key: &CountKey) -> Result<(), CacheError>;

    /// One bulk pass over the status entries for `user_id`.
    async fn batch_status(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<CacheLookup<bool>, CacheError>;

    /// One bulk pass over the count entries.
    async fn batch_count(&self, targets: &[TargetRef]) -> Result<CacheLookup<i64>, CacheError>;
}
