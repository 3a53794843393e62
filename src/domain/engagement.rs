//! The engagement relation: one durable flag per (user, target) pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Kind of entity an engagement points at.
///
/// The kind participates in the store's unique key, every store filter and
/// every cache key, so a comment and a course that happen to share an
/// identifier never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Course,
    Comment,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Comment => "comment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "course" => Some(Self::Course),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified target of an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: String,
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Durable record of one (user, target) engagement flag.
///
/// `active: None` is a legacy row shape: the record exists but the flag was
/// never written. Such rows count as engaged; only an explicit `false` means
/// the user un-liked the target. "Present and not explicitly false" is the
/// definition of engaged, not "explicitly true".
#[derive(Debug, Clone)]
pub struct EngagementRecord {
    pub id: Uuid,
    pub user_id: String,
    pub target: TargetRef,
    pub active: Option<bool>,
    /// Set once at first creation, never modified afterwards.
    pub created_at: OffsetDateTime,
    /// Set on every toggle.
    pub updated_at: OffsetDateTime,
}

impl EngagementRecord {
    pub fn is_engaged(&self) -> bool {
        self.active != Some(false)
    }
}

/// Reject blank identifiers before any I/O happens.
pub fn validate_pair(user_id: &str, target: &TargetRef) -> Result<(), DomainError> {
    if user_id.trim().is_empty() {
        return Err(DomainError::validation("user id must not be empty"));
    }
    validate_target(target)
}

pub fn validate_target(target: &TargetRef) -> Result<(), DomainError> {
    if target.id.trim().is_empty() {
        return Err(DomainError::validation("target id must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(active: Option<bool>) -> EngagementRecord {
        EngagementRecord {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            target: TargetRef::new(TargetKind::Course, "c1"),
            active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn explicit_flags_round_trip() {
        assert!(record(Some(true)).is_engaged());
        assert!(!record(Some(false)).is_engaged());
    }

    #[test]
    fn legacy_record_without_flag_counts_as_engaged() {
        assert!(record(None).is_engaged());
    }

    #[test]
    fn kind_parse_matches_as_str() {
        for kind in [TargetKind::Course, TargetKind::Comment] {
            assert_eq!(TargetKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TargetKind::parse("lesson"), None);
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        let target = TargetRef::new(TargetKind::Comment, "m1");
        assert!(validate_pair("u1", &target).is_ok());
        assert!(validate_pair("", &target).is_err());
        assert!(validate_pair("  ", &target).is_err());

        let blank = TargetRef::new(TargetKind::Comment, "");
        assert!(validate_pair("u1", &blank).is_err());
        assert!(validate_target(&blank).is_err());
    }
}
