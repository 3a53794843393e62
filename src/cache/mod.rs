//! Kudos cache subsystem.
//!
//! A look-aside acceleration layer in front of the engagement store:
//!
//! - **Status entries**: per-(user, target) engagement flags
//! - **Count entries**: per-target aggregate counts
//!
//! The cache is best-effort and never authoritative. Entries are TTL-bounded;
//! an expired or evicted entry means "unknown", never "false" or zero.
//!
//! ## Configuration
//!
//! Behavior is controlled via `kudos.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! status_ttl_secs = 600
//! count_ttl_secs = 600
//! # ... see config.rs for all options
//! ```

mod config;
mod contract;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use contract::{CacheError, CacheLookup, CounterCache};
pub use keys::{CountKey, StatusKey};
pub use store::{METRIC_COUNT_EVICT, METRIC_STATUS_EVICT, MemoryCounterCache};
