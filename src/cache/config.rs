//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_STATUS_TTL_SECS: u64 = 600;
const DEFAULT_COUNT_TTL_SECS: u64 = 600;
const DEFAULT_STATUS_LIMIT: usize = 100_000;
const DEFAULT_COUNT_LIMIT: usize = 50_000;

/// Cache configuration from `kudos.toml`.
///
/// TTLs bound how long a stale entry can survive an out-of-order write-back;
/// they are a self-healing window, not a correctness mechanism. The defaults
/// keep that window at ten minutes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the look-aside cache. When off, every read goes to the store.
    pub enabled: bool,
    /// Lifetime of per-(user, target) status entries, in seconds.
    pub status_ttl_secs: u64,
    /// Lifetime of per-target count entries, in seconds.
    pub count_ttl_secs: u64,
    /// Maximum status entries held before LRU eviction.
    pub status_limit: usize,
    /// Maximum count entries held before LRU eviction.
    pub count_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            status_ttl_secs: DEFAULT_STATUS_TTL_SECS,
            count_ttl_secs: DEFAULT_COUNT_TTL_SECS,
            status_limit: DEFAULT_STATUS_LIMIT,
            count_limit: DEFAULT_COUNT_LIMIT,
        }
    }
}

impl CacheConfig {
    /// Configuration for cache-off deployments.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn count_ttl(&self) -> Duration {
        Duration::from_secs(self.count_ttl_secs)
    }

    /// Returns the status entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn status_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.status_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the count entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn count_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.count_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
