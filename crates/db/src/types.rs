use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "in_review")]
    InReview,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    /// The fixed transition table. Anything not listed here is a conflict.
    pub fn allowed_next(self) -> &'static [TaskStatus] {
        match self {
            TaskStatus::Open => &[TaskStatus::Claimed],
            TaskStatus::Claimed => &[TaskStatus::InProgress, TaskStatus::Cancelled],
            TaskStatus::InProgress => &[TaskStatus::InReview, TaskStatus::Cancelled],
            TaskStatus::InReview => &[TaskStatus::Done, TaskStatus::Cancelled],
            TaskStatus::Done | TaskStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

impl TaskPriority {
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
            TaskPriority::Critical => 3,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentMode {
    #[default]
    #[sea_orm(string_value = "owner_assigns")]
    OwnerAssigns,
    #[sea_orm(string_value = "fcfs")]
    Fcfs,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    #[sea_orm(string_value = "none")]
    None,
    #[sea_orm(string_value = "poster_held")]
    PosterHeld,
    #[sea_orm(string_value = "both_held")]
    BothHeld,
    #[sea_orm(string_value = "settled")]
    Settled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl EscrowStatus {
    /// Points are still in custody and a settlement or refund is pending.
    pub fn is_held(self) -> bool {
        matches!(self, EscrowStatus::PosterHeld | EscrowStatus::BothHeld)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, EscrowStatus::Settled | EscrowStatus::Refunded)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    #[sea_orm(string_value = "escrow_hold")]
    EscrowHold,
    #[sea_orm(string_value = "escrow_release")]
    EscrowRelease,
    #[sea_orm(string_value = "escrow_forfeit")]
    EscrowForfeit,
    #[sea_orm(string_value = "bounty_payout")]
    BountyPayout,
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "vote_received")]
    VoteReceived,
    #[sea_orm(string_value = "milestone_bonus")]
    MilestoneBonus,
    #[sea_orm(string_value = "early_completion_bonus")]
    EarlyCompletionBonus,
    #[sea_orm(string_value = "grant")]
    Grant,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MilestoneKind {
    #[sea_orm(string_value = "first_task_posted")]
    FirstTaskPosted,
    #[sea_orm(string_value = "first_task_completed")]
    FirstTaskCompleted,
    #[sea_orm(string_value = "five_completions")]
    FiveCompletions,
    #[sea_orm(string_value = "ten_completions")]
    TenCompletions,
}

impl MilestoneKind {
    /// Completion milestones keyed by the exact count that triggers them.
    pub const COMPLETION_THRESHOLDS: [(i64, MilestoneKind); 3] = [
        (1, MilestoneKind::FirstTaskCompleted),
        (5, MilestoneKind::FiveCompletions),
        (10, MilestoneKind::TenCompletions),
    ];

    pub fn for_completion_count(count: i64) -> Option<MilestoneKind> {
        Self::COMPLETION_THRESHOLDS
            .iter()
            .find(|(threshold, _)| *threshold == count)
            .map(|(_, kind)| *kind)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    #[sea_orm(string_value = "task_claimed")]
    TaskClaimed,
    #[sea_orm(string_value = "task_assigned")]
    TaskAssigned,
    #[sea_orm(string_value = "escrow_accepted")]
    EscrowAccepted,
    #[sea_orm(string_value = "task_in_review")]
    TaskInReview,
    #[sea_orm(string_value = "task_cancelled")]
    TaskCancelled,
    #[sea_orm(string_value = "task_completed")]
    TaskCompleted,
    #[sea_orm(string_value = "task_settled")]
    TaskSettled,
}
