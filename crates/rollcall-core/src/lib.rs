//! Rollcall core - member activity scoring and monthly reports for club
//! rosters.
//!
//! A reporting pass reads an immutable roster `Snapshot`, scores every
//! member, classifies engagement, detects reward milestones and composes
//! the monthly report text:
//!
//! ```text
//! RawSnapshot -> Snapshot -> scoring -> status -> milestone -> report
//! ```
//!
//! Front ends (the loader, a CLI, a bot) are expected to build the snapshot,
//! pick the period and call `ActivityEngine::run`.

pub mod engine;
pub mod error;
pub mod highlights;
pub mod milestone;
pub mod models;
pub mod period;
pub mod policy;
pub mod report;
pub mod scoring;
pub mod snapshot;
pub mod status;
pub mod utils;

pub use engine::{run_pass, ActivityEngine, ActivityPass};
pub use error::{ConfigError, DataIssue, Diagnostics, EngineError, Result};
pub use highlights::{CohortStat, EventTrend, FirstAttendance, Highlights, MonthlyCount};
pub use milestone::{Award, MilestoneDetector};
pub use models::{AttendanceLink, Event, EventId, Member, MemberId, MemberSummary, Role};
pub use period::ReportingPeriod;
pub use policy::{PolicyConfig, RewardTier};
pub use report::{EventBlock, Report};
pub use snapshot::{RawSnapshot, Snapshot};
pub use status::{MemberStatus, StatusClassifier};
