//! Cache key definitions.

use std::fmt;

use crate::domain::TargetRef;

/// Key of a per-(user, target) status entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusKey {
    pub user_id: String,
    pub target: TargetRef,
}

impl StatusKey {
    pub fn new(user_id: impl Into<String>, target: TargetRef) -> Self {
        Self {
            user_id: user_id.into(),
            target,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status:{}:{}", self.target, self.user_id)
    }
}

/// Key of a per-target aggregate count entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountKey {
    pub target: TargetRef,
}

impl CountKey {
    pub fn new(target: TargetRef) -> Self {
        Self { target }
    }
}

impl fmt::Display for CountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "count:{}", self.target)
    }
}
