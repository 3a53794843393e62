//! Application services layer.

pub mod engine;
pub mod repos;

pub use engine::{CounterEngine, EngineError, ToggleOutcome};
pub use repos::{EngagementStore, RepoError};
