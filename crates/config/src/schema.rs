use db::types::MilestoneKind;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

fn default_arbiter_handle() -> String {
    "queenbee".to_string()
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub silver: i64,
    pub gold: i64,
    pub platinum: i64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            silver: 100,
            gold: 500,
            platinum: 1000,
        }
    }
}

impl TierThresholds {
    /// Minimum balance for `tier`.
    pub fn minimum(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Bronze => 0,
            Tier::Silver => self.silver,
            Tier::Gold => self.gold,
            Tier::Platinum => self.platinum,
        }
    }

    fn is_ascending(&self) -> bool {
        0 < self.silver && self.silver < self.gold && self.gold < self.platinum
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneBonuses {
    #[serde(alias = "firstTaskPosted")]
    pub first_task_posted: i64,
    #[serde(alias = "firstTaskCompleted")]
    pub first_task_completed: i64,
    #[serde(alias = "fiveCompletions")]
    pub five_completions: i64,
    #[serde(alias = "tenCompletions")]
    pub ten_completions: i64,
}

impl Default for MilestoneBonuses {
    fn default() -> Self {
        Self {
            first_task_posted: 5,
            first_task_completed: 10,
            five_completions: 25,
            ten_completions: 50,
        }
    }
}

impl MilestoneBonuses {
    pub fn amount(&self, milestone: MilestoneKind) -> i64 {
        match milestone {
            MilestoneKind::FirstTaskPosted => self.first_task_posted,
            MilestoneKind::FirstTaskCompleted => self.first_task_completed,
            MilestoneKind::FiveCompletions => self.five_completions,
            MilestoneKind::TenCompletions => self.ten_completions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    #[serde(alias = "dailyVoteCap")]
    pub daily_vote_cap: i64,
    #[serde(alias = "upvotePoints")]
    pub upvote_points: i64,
    #[serde(alias = "downvotePoints")]
    pub downvote_points: i64,
    #[serde(alias = "earlyCompletionBonusPercent")]
    pub early_completion_bonus_percent: i64,
    #[serde(alias = "assigneeEscrowPercent")]
    pub assignee_escrow_percent: i64,
    #[serde(alias = "milestoneBonuses")]
    pub milestone_bonuses: MilestoneBonuses,
    pub tiers: TierThresholds,
    #[serde(alias = "escrowMinTier")]
    pub escrow_min_tier: Tier,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            daily_vote_cap: 50,
            upvote_points: 2,
            downvote_points: -1,
            early_completion_bonus_percent: 10,
            assignee_escrow_percent: 10,
            milestone_bonuses: MilestoneBonuses::default(),
            tiers: TierThresholds::default(),
            escrow_min_tier: Tier::Silver,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    #[serde(alias = "arbiterHandle", default = "default_arbiter_handle")]
    pub arbiter_handle: String,
    pub economy: EconomyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            arbiter_handle: default_arbiter_handle(),
            economy: EconomyConfig::default(),
        }
    }
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Replaces values the economy cannot run with by their defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = EconomyConfig::default();
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        let trimmed = self.arbiter_handle.trim();
        self.arbiter_handle = if trimmed.is_empty() {
            default_arbiter_handle()
        } else {
            trimmed.to_string()
        };

        let economy = &mut self.economy;
        if economy.daily_vote_cap < 0 {
            tracing::warn!("daily_vote_cap must not be negative, using default");
            economy.daily_vote_cap = defaults.daily_vote_cap;
        }
        if economy.upvote_points < 0 {
            economy.upvote_points = defaults.upvote_points;
        }
        if economy.downvote_points > 0 {
            economy.downvote_points = defaults.downvote_points;
        }
        if !(0..=100).contains(&economy.early_completion_bonus_percent) {
            economy.early_completion_bonus_percent = defaults.early_completion_bonus_percent;
        }
        if !(0..=100).contains(&economy.assignee_escrow_percent) {
            economy.assignee_escrow_percent = defaults.assignee_escrow_percent;
        }
        let bonuses = &economy.milestone_bonuses;
        if [
            bonuses.first_task_posted,
            bonuses.first_task_completed,
            bonuses.five_completions,
            bonuses.ten_completions,
        ]
        .iter()
        .any(|amount| *amount < 0)
        {
            tracing::warn!("milestone bonuses must not be negative, using defaults");
            economy.milestone_bonuses = defaults.milestone_bonuses;
        }
        if !economy.tiers.is_ascending() {
            tracing::warn!("tier thresholds must be strictly ascending, using defaults");
            economy.tiers = defaults.tiers;
        }
        self
    }
}
