use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

use crate::types::{AssignmentMode, EscrowStatus, TaskPriority, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub author_id: i64,
    pub assignee_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub points: i64,
    pub assignment_mode: AssignmentMode,
    pub deadline: Option<DateTimeUtc>,
    pub poster_escrow: i64,
    pub assignee_escrow: i64,
    pub escrow_status: EscrowStatus,
    pub labels: JsonValue,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub pr_url: Option<String>,
    pub estimated_effort: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub tests: Option<String>,
    pub claimed_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
