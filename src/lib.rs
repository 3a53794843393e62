//! Kudos: a per-user engagement toggle engine with a look-aside counter cache.
//!
//! The crate is layered the same way top to bottom:
//!
//! - [`domain`] holds the engagement records, target references, and the
//!   validation rules they carry.
//! - [`application`] hosts the [`CounterEngine`](application::CounterEngine),
//!   which orchestrates the durable store and the cache, and the traits the
//!   engine is built against.
//! - [`cache`] provides the cache contract plus an in-process TTL + LRU
//!   implementation.
//! - [`infra`] supplies the Postgres-backed store and telemetry wiring.
//! - [`config`] loads and validates layered settings (files, then
//!   `KUDOS__`-prefixed environment variables).
//!
//! Reads are served cache-first and fall back to the store on a miss; cache
//! failures degrade to store reads and never surface to callers. Toggles hit
//! the store first and only then refresh the cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::{CounterEngine, EngagementStore, EngineError, RepoError, ToggleOutcome};
pub use cache::{CacheConfig, CacheError, CounterCache, MemoryCounterCache};
pub use domain::{EngagementRecord, TargetKind, TargetRef};
