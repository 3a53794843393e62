//! Store trait describing the durable persistence adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TargetRef;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store timeout")]
    Timeout,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Durable, atomic state transitions for engagement records.
///
/// The store owns the only authoritative state. A record is "engaged" when
/// it exists and is not explicitly inactive; rows whose flag was never
/// written count as engaged. I/O failures surface as errors and are never
/// reported as "not engaged" or a zero count.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Atomically flip the flag for (user, target) and return the persisted
    /// value.
    ///
    /// No record means the first interaction: insert as engaged. Concurrent
    /// toggles on the same pair must serialize inside the store; the
    /// returned flag is whatever actually won, never a stale read.
    async fn toggle(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError>;

    async fn is_active(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError>;

    async fn count_active(&self, target: &TargetRef) -> Result<i64, RepoError>;

    /// One grouped query; only engaged targets appear in the result (as
    /// `true`). The caller treats absent targets as not engaged.
    async fn batch_is_active(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, bool>, RepoError>;

    /// Grouped aggregation with explicit zero-fill: every requested target
    /// appears, zero when nothing is engaged. Omission would make "no
    /// engagements" indistinguishable from "not queried".
    async fn batch_count_active(
        &self,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, i64>, RepoError>;
}
