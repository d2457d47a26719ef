//! Reward milestone detection.
//!
//! A member earns a milestone when its score crossed a reward threshold
//! during the period: `current >= t` and `current - period < t`. The reward
//! table is walked from the highest threshold down and the first crossing
//! wins, so a member jumping several tiers at once gets only the top one.

use serde::Serialize;

use crate::error::ConfigError;
use crate::models::{MemberId, MemberSummary};
use crate::policy::{validate_rewards, RewardTier};

/// A reward earned in the reporting period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Award {
    pub member_id: MemberId,
    pub name: String,
    pub current_score: i64,
    pub previous_score: i64,
    pub threshold: i64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct MilestoneDetector {
    rewards: Vec<RewardTier>,
}

impl MilestoneDetector {
    /// Fails unless the table is non-empty and strictly descending.
    pub fn new(rewards: Vec<RewardTier>) -> Result<Self, ConfigError> {
        validate_rewards(&rewards)?;
        Ok(Self { rewards })
    }

    pub fn rewards(&self) -> &[RewardTier] {
        &self.rewards
    }

    /// Highest threshold crossed this period, if any.
    pub fn detect(&self, current_score: i64, period_score: i64) -> Option<&RewardTier> {
        if period_score <= 0 {
            return None;
        }
        let previous_score = current_score.saturating_sub(period_score);
        self.rewards
            .iter()
            .find(|tier| current_score >= tier.threshold && previous_score < tier.threshold)
    }

    pub fn award_for(&self, summary: &MemberSummary) -> Option<Award> {
        self.detect(summary.current_score, summary.period_score)
            .map(|tier| Award {
                member_id: summary.member_id.clone(),
                name: summary.name.clone(),
                current_score: summary.current_score,
                previous_score: summary.previous_score(),
                threshold: tier.threshold,
                label: tier.label.clone(),
            })
    }
}
