//! Domain layer types and invariants.

pub mod engagement;
pub mod error;

pub use engagement::{EngagementRecord, TargetKind, TargetRef};
pub use error::DomainError;
