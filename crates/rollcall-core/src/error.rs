//! Error types for reporting passes.
//!
//! Two families live here:
//!
//! - `EngineError` / `ConfigError`: fatal. A pass never starts with a broken
//!   policy or an unparsable period.
//! - `DataIssue`: recoverable data-quality notes. The affected row is repaired
//!   or dropped and the note is collected in `Diagnostics`.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{EventId, MemberId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Reward table is empty")]
    EmptyRewardTable,

    #[error("Reward thresholds must be strictly descending: {previous} is followed by {next}")]
    ThresholdsNotDescending { previous: i64, next: i64 },

    #[error("Reward threshold must be positive: {0}")]
    NonPositiveThreshold(i64),

    #[error("Reward label is empty for threshold {0}")]
    EmptyRewardLabel(i64),

    #[error("{0} must be at least one day")]
    EmptyWindow(&'static str),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Which end of an attendance link is dangling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSide {
    Event,
    Member,
    Both,
}

impl std::fmt::Display for MissingSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingSide::Event => write!(f, "event"),
            MissingSide::Member => write!(f, "member"),
            MissingSide::Both => write!(f, "event and member"),
        }
    }
}

/// Where a score value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "record", content = "id", rename_all = "snake_case")]
pub enum ScoreField {
    BasePoint(MemberId),
    EventScore(EventId),
}

impl std::fmt::Display for ScoreField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreField::BasePoint(id) => write!(f, "base point of member {}", id),
            ScoreField::EventScore(id) => write!(f, "score of event {}", id),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    #[error("Attendance ({event_id}, {member_id}) references a missing {missing}; link dropped")]
    MissingReference {
        event_id: EventId,
        member_id: MemberId,
        missing: MissingSide,
    },

    #[error("Invalid {field}: {value:?}; using 0")]
    InvalidScore { field: ScoreField, value: Option<String> },

    #[error("Invalid date on event {event_id}: {value:?}; left out of period totals")]
    InvalidDate { event_id: EventId, value: Option<String> },

    #[error("Duplicate member id {member_id}; later row ignored")]
    DuplicateMember { member_id: MemberId },

    #[error("Duplicate event id {event_id}; later row ignored")]
    DuplicateEvent { event_id: EventId },

    #[error("Duplicate attendance ({event_id}, {member_id}) ignored")]
    DuplicateAttendance { event_id: EventId, member_id: MemberId },

    #[error("Event {event_id} names unknown host {host}; host cleared")]
    UnknownHost { event_id: EventId, host: MemberId },

    #[error("Unknown role {value:?} for member {member_id}; treated as member")]
    UnknownRole { member_id: MemberId, value: String },

    #[error("Invalid registration timestamp for member {member_id}: {value:?}")]
    InvalidRegistration { member_id: MemberId, value: Option<String> },

    #[error("Unreadable last attendance date for member {member_id}: {value:?}; using attendance")]
    InvalidLastAttended { member_id: MemberId, value: String },

    #[error("Member {member_id} last attended {supplied}, attendance says {derived:?}; using attendance")]
    StaleLastAttended {
        member_id: MemberId,
        supplied: NaiveDate,
        derived: Option<NaiveDate>,
    },
}

/// Data-quality notes collected while building a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    issues: Vec<DataIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, issue: DataIssue) {
        warn!(issue = %issue, "Data quality note");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[DataIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Attendance links dropped because an end was missing
    pub fn dropped_links(&self) -> usize {
        self.count(|issue| matches!(issue, DataIssue::MissingReference { .. }))
    }

    pub fn invalid_scores(&self) -> usize {
        self.count(|issue| matches!(issue, DataIssue::InvalidScore { .. }))
    }

    pub fn invalid_dates(&self) -> usize {
        self.count(|issue| matches!(issue, DataIssue::InvalidDate { .. }))
    }

    /// Events left out of period totals
    pub fn undated_events(&self) -> Vec<&EventId> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                DataIssue::InvalidDate { event_id, .. } => Some(event_id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn has_invalid_date(&self, id: &EventId) -> bool {
        self.issues.iter().any(|issue| {
            matches!(issue, DataIssue::InvalidDate { event_id, .. } if event_id == id)
        })
    }

    fn count(&self, predicate: impl Fn(&DataIssue) -> bool) -> usize {
        self.issues.iter().filter(|issue| predicate(issue)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counters() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(DataIssue::MissingReference {
            event_id: EventId::from("1"),
            member_id: MemberId::from("9"),
            missing: MissingSide::Member,
        });
        diagnostics.record(DataIssue::InvalidScore {
            field: ScoreField::EventScore(EventId::from("1")),
            value: Some("ten".to_string()),
        });
        diagnostics.record(DataIssue::InvalidDate {
            event_id: EventId::from("2"),
            value: Some("someday".to_string()),
        });

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.dropped_links(), 1);
        assert_eq!(diagnostics.invalid_scores(), 1);
        assert_eq!(diagnostics.invalid_dates(), 1);
        assert_eq!(diagnostics.undated_events(), vec![&EventId::from("2")]);
        assert!(diagnostics.has_invalid_date(&EventId::from("2")));
        assert!(!diagnostics.has_invalid_date(&EventId::from("1")));
    }

    #[test]
    fn test_issue_messages() {
        let issue = DataIssue::MissingReference {
            event_id: EventId::from("5"),
            member_id: MemberId::from("7"),
            missing: MissingSide::Event,
        };
        assert_eq!(
            issue.to_string(),
            "Attendance (5, 7) references a missing event; link dropped"
        );

        let issue = DataIssue::InvalidScore {
            field: ScoreField::BasePoint(MemberId::from("3")),
            value: None,
        };
        assert_eq!(issue.to_string(), "Invalid base point of member 3: None; using 0");
    }

    #[test]
    fn test_config_error_messages() {
        let err = EngineError::from(ConfigError::ThresholdsNotDescending { previous: 30, next: 50 });
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Reward thresholds must be strictly descending: 30 is followed by 50"
        );
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = DataIssue::DuplicateMember { member_id: MemberId::from("4") };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "duplicate_member");
        assert_eq!(json["member_id"], "4");
    }
}
