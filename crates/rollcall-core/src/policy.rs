//! Scoring policy configuration.
//!
//! The policy holds the dormancy windows, the reward table and the text
//! bits the monthly report needs. It is handed to the engine explicitly at
//! the start of a pass; nothing here is process-global.
//!
//! The default location is `~/.config/rollcall/policy.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Application name used for the config directory path
const APP_NAME: &str = "rollcall";

/// Policy file name
const POLICY_FILE: &str = "policy.json";

/// Days a newcomer may go without attending before it is flagged
pub const DEFAULT_NEW_MEMBER_DAYS: i64 = 60;

/// Days without attendance before a member counts as dormant
pub const DEFAULT_DORMANT_DAYS: i64 = 90;

const DEFAULT_SIGN_OFF: &str = "Stay healthy, see you on the next hike! ⛰️";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    pub threshold: i64,
    pub label: String,
}

impl RewardTier {
    pub fn new(threshold: i64, label: impl Into<String>) -> Self {
        Self {
            threshold,
            label: label.into(),
        }
    }
}

/// Default reward table, highest threshold first
pub fn default_rewards() -> Vec<RewardTier> {
    vec![
        RewardTier::new(100, "💯 Special award"),
        RewardTier::new(50, "🎫 50 points reached"),
        RewardTier::new(30, "🎫 30 points reached"),
        RewardTier::new(10, "🎫 10 points reached"),
    ]
}

/// Check that a reward table is usable for first-match detection: non-empty,
/// positive thresholds in strictly descending order, every tier labelled.
pub fn validate_rewards(rewards: &[RewardTier]) -> std::result::Result<(), ConfigError> {
    if rewards.is_empty() {
        return Err(ConfigError::EmptyRewardTable);
    }
    for tier in rewards {
        if tier.threshold <= 0 {
            return Err(ConfigError::NonPositiveThreshold(tier.threshold));
        }
        if tier.label.trim().is_empty() {
            return Err(ConfigError::EmptyRewardLabel(tier.threshold));
        }
    }
    for pair in rewards.windows(2) {
        if pair[1].threshold >= pair[0].threshold {
            return Err(ConfigError::ThresholdsNotDescending {
                previous: pair[0].threshold,
                next: pair[1].threshold,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// N_new: registration window for the "new, not yet attended" warning
    pub new_member_days: i64,
    /// N_sleep: attendance gap for the "long-term absence" warning
    pub dormant_days: i64,
    pub rewards: Vec<RewardTier>,
    /// Club rules link printed above the report
    pub rules_url: Option<String>,
    /// Last line of the report
    pub sign_off: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            new_member_days: DEFAULT_NEW_MEMBER_DAYS,
            dormant_days: DEFAULT_DORMANT_DAYS,
            rewards: default_rewards(),
            rules_url: None,
            sign_off: DEFAULT_SIGN_OFF.to_string(),
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.new_member_days < 1 {
            return Err(ConfigError::EmptyWindow("new_member_days"));
        }
        if self.dormant_days < 1 {
            return Err(ConfigError::EmptyWindow("dormant_days"));
        }
        validate_rewards(&self.rewards)
    }

    /// Load the policy from the user config directory, or defaults when no
    /// policy file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::policy_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "No policy file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
        let policy: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse policy file: {}", path.display()))?;
        debug!(
            path = %path.display(),
            new_member_days = policy.new_member_days,
            dormant_days = policy.dormant_days,
            tiers = policy.rewards.len(),
            "Loaded policy"
        );
        Ok(policy)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write policy file: {}", path.display()))?;
        Ok(())
    }

    pub fn policy_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(POLICY_FILE))
    }
}
