//! The reporting pass.
//!
//! `ActivityEngine` is built once from a validated `PolicyConfig` and then
//! runs any number of passes. A pass takes an immutable `Snapshot`, a
//! `ReportingPeriod` and an evaluation time, and produces summaries, awards,
//! highlights and the composed report in one go. The engine holds no mutable
//! state, so passes over different snapshots can run concurrently.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Diagnostics, Result};
use crate::highlights::{self, FirstAttendance, Highlights};
use crate::milestone::{Award, MilestoneDetector};
use crate::models::MemberSummary;
use crate::period::ReportingPeriod;
use crate::policy::PolicyConfig;
use crate::report::{self, EventBlock, Report, ReportContext};
use crate::scoring;
use crate::snapshot::Snapshot;
use crate::status::{MemberStatus, StatusClassifier};

/// Everything one pass produced
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPass {
    pub period: ReportingPeriod,
    pub evaluated_at: NaiveDateTime,
    /// One row per member still on the roster, in member id order
    pub summaries: Vec<MemberSummary>,
    pub awards: Vec<Award>,
    pub first_attendances: Vec<FirstAttendance>,
    pub event_blocks: Vec<EventBlock>,
    pub highlights: Highlights,
    /// Data-quality notes carried over from the snapshot
    pub diagnostics: Diagnostics,
    pub report: Report,
}

impl ActivityPass {
    /// Summaries with the given status
    pub fn with_status(&self, status: MemberStatus) -> impl Iterator<Item = &MemberSummary> {
        self.summaries.iter().filter(move |summary| summary.status == status)
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEngine {
    policy: PolicyConfig,
    classifier: StatusClassifier,
    detector: MilestoneDetector,
}

impl ActivityEngine {
    /// Validate the policy and prepare the pass stages.
    pub fn new(policy: PolicyConfig) -> Result<Self> {
        policy.validate()?;
        let detector = MilestoneDetector::new(policy.rewards.clone())?;
        let classifier = StatusClassifier::from_policy(&policy);
        Ok(Self {
            policy,
            classifier,
            detector,
        })
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Score and classify every member still on the roster.
    pub fn summarize(
        &self,
        snapshot: &Snapshot,
        period: ReportingPeriod,
        now: NaiveDateTime,
    ) -> Vec<MemberSummary> {
        scoring::aggregate(snapshot, period)
            .into_iter()
            .filter_map(|(id, tally)| {
                let member = snapshot.member(&id)?;
                let status = self
                    .classifier
                    .classify(member, snapshot.events_attended_by(&id), now);
                Some(MemberSummary {
                    member_id: id,
                    name: member.name.clone(),
                    current_score: tally.current,
                    period_score: tally.period,
                    status,
                })
            })
            .collect()
    }

    pub fn run(&self, snapshot: &Snapshot, period: ReportingPeriod, now: NaiveDateTime) -> ActivityPass {
        let summaries = self.summarize(snapshot, period, now);
        let awards: Vec<Award> = summaries
            .iter()
            .filter_map(|summary| self.detector.award_for(summary))
            .collect();
        let first_attendances = highlights::first_attendances(snapshot, period);
        let event_blocks = report::event_blocks(snapshot, period);
        let highlights = highlights::compute(
            snapshot,
            period,
            &summaries,
            now,
            self.policy.dormant_days,
        );

        let report = report::compose(&ReportContext {
            period,
            policy: &self.policy,
            blocks: &event_blocks,
            summaries: &summaries,
            awards: &awards,
            first_attendances: &first_attendances,
        });

        for award in &awards {
            debug!(
                member = %award.member_id,
                previous = award.previous_score,
                current = award.current_score,
                threshold = award.threshold,
                "Milestone reached"
            );
        }

        info!(
            period = %period,
            members = summaries.len(),
            events = event_blocks.len(),
            awards = awards.len(),
            dormant = summaries.iter().filter(|s| s.status.is_dormant()).count(),
            issues = snapshot.diagnostics().len(),
            "Reporting pass complete"
        );

        ActivityPass {
            period,
            evaluated_at: now,
            summaries,
            awards,
            first_attendances,
            event_blocks,
            highlights,
            diagnostics: snapshot.diagnostics().clone(),
            report,
        }
    }
}

/// Validate `policy` and run a single pass.
pub fn run_pass(
    policy: PolicyConfig,
    snapshot: &Snapshot,
    period: ReportingPeriod,
    now: NaiveDateTime,
) -> Result<ActivityPass> {
    Ok(ActivityEngine::new(policy)?.run(snapshot, period, now))
}
