//! Score aggregation.
//!
//! `current = base_point + Σ attended event scores` for every member still on
//! the roster, and `period = Σ attended event scores inside the period`.
//! Undated events add to `current` only.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::models::MemberId;
use crate::period::ReportingPeriod;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub current: i64,
    pub period: i64,
    /// Events attended, all time
    pub attended: usize,
    /// Events attended inside the period
    pub attended_in_period: usize,
}

impl ScoreTally {
    /// Score before the period started
    pub fn previous(&self) -> i64 {
        self.current.saturating_sub(self.period)
    }
}

/// Tally scores for every non-excluded member, keyed (and ordered) by id.
pub fn aggregate(snapshot: &Snapshot, period: ReportingPeriod) -> BTreeMap<MemberId, ScoreTally> {
    let tallies: BTreeMap<MemberId, ScoreTally> = snapshot
        .members()
        .iter()
        .filter(|member| !member.is_excluded())
        .map(|member| {
            let mut tally = ScoreTally {
                current: member.base_point,
                ..ScoreTally::default()
            };
            for event in snapshot.events_attended_by(&member.id) {
                tally.current = tally.current.saturating_add(event.score);
                tally.attended += 1;
                if period.contains_opt(event.date) {
                    tally.period = tally.period.saturating_add(event.score);
                    tally.attended_in_period += 1;
                }
            }
            (member.id.clone(), tally)
        })
        .collect();

    debug!(
        period = %period,
        members = tallies.len(),
        active_in_period = tallies.values().filter(|t| t.attended_in_period > 0).count(),
        "Scores aggregated"
    );

    tallies
}
