use serde::Serialize;

use super::MemberId;
use crate::status::MemberStatus;

/// Per-member result of a reporting pass. Rebuilt on every pass and never
/// written back to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MemberSummary {
    pub member_id: MemberId,
    pub name: String,
    /// Base point plus every attended event score.
    pub current_score: i64,
    /// Scores of attended events inside the reporting period.
    pub period_score: i64,
    pub status: MemberStatus,
}

impl MemberSummary {
    /// Score before the reporting period started.
    pub fn previous_score(&self) -> i64 {
        self.current_score.saturating_sub(self.period_score)
    }
}
