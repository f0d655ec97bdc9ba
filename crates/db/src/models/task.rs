use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

pub use crate::types::{AssignmentMode, EscrowStatus, TaskPriority, TaskStatus};
use crate::{entities::task, models::ids};

pub const DEFAULT_LIST_LIMIT: u64 = 25;
pub const MAX_LIST_LIMIT: u64 = 100;
const LABEL_SCAN_PAGE_SIZE: u64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(skip)]
    pub row_id: i64,
    #[serde(skip)]
    pub author_row_id: i64,
    #[serde(skip)]
    pub assignee_row_id: Option<i64>,
    pub author: String,
    pub assignee: Option<String>,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub points: i64,
    pub assignment_mode: AssignmentMode,
    pub deadline: Option<DateTime<Utc>>,
    pub poster_escrow: i64,
    pub assignee_escrow: i64,
    pub escrow_status: EscrowStatus,
    pub labels: Vec<String>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub pr_url: Option<String>,
    pub estimated_effort: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub tests: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; escrow fields are decided by the caller.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub points: i64,
    pub priority: TaskPriority,
    pub assignment_mode: AssignmentMode,
    pub deadline: Option<DateTime<Utc>>,
    pub poster_escrow: i64,
    pub escrow_status: EscrowStatus,
    pub labels: Vec<String>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub pr_url: Option<String>,
    pub estimated_effort: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub tests: Option<String>,
}

impl NewTask {
    pub fn simple(title: &str, points: i64) -> Self {
        Self {
            title: title.to_string(),
            content: String::new(),
            url: None,
            points,
            priority: TaskPriority::default(),
            assignment_mode: AssignmentMode::default(),
            deadline: None,
            poster_escrow: 0,
            escrow_status: EscrowStatus::None,
            labels: Vec::new(),
            repo_url: None,
            branch: None,
            pr_url: None,
            estimated_effort: None,
            acceptance_criteria: None,
            tests: None,
        }
    }
}

/// Non-financial fields. `Some(None)` clears an optional column.
#[derive(Debug, Clone, Default)]
pub struct TaskMetadata {
    pub priority: Option<TaskPriority>,
    pub labels: Option<Vec<String>>,
    pub repo_url: Option<Option<String>>,
    pub branch: Option<Option<String>>,
    pub pr_url: Option<Option<String>>,
    pub estimated_effort: Option<Option<String>>,
}

impl TaskMetadata {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
            && self.labels.is_none()
            && self.repo_url.is_none()
            && self.branch.is_none()
            && self.pr_url.is_none()
            && self.estimated_effort.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskSort {
    #[default]
    Hot,
    New,
    Top,
    Urgent,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub labels: Vec<String>,
    pub sort: TaskSort,
    pub limit: Option<u64>,
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let author = ids::account_handle_by_id(db, model.author_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Account not found".to_string()))?;
        let assignee = ids::required_handle(db, model.assignee_id).await?;
        let labels = serde_json::from_value(model.labels).unwrap_or_default();

        Ok(Self {
            id: model.uuid,
            row_id: model.id,
            author_row_id: model.author_id,
            assignee_row_id: model.assignee_id,
            author,
            assignee,
            title: model.title,
            content: model.content,
            url: model.url,
            status: model.status,
            priority: model.priority,
            points: model.points,
            assignment_mode: model.assignment_mode,
            deadline: model.deadline.map(Into::into),
            poster_escrow: model.poster_escrow,
            assignee_escrow: model.assignee_escrow,
            escrow_status: model.escrow_status,
            labels,
            repo_url: model.repo_url,
            branch: model.branch,
            pr_url: model.pr_url,
            estimated_effort: model.estimated_effort,
            acceptance_criteria: model.acceptance_criteria,
            tests: model.tests,
            claimed_at: model.claimed_at.map(Into::into),
            completed_at: model.completed_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &NewTask,
        author_row_id: i64,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let labels = serde_json::to_value(&data.labels)
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        let active = task::ActiveModel {
            uuid: Set(id),
            author_id: Set(author_row_id),
            assignee_id: Set(None),
            title: Set(data.title.clone()),
            content: Set(data.content.clone()),
            url: Set(data.url.clone()),
            status: Set(TaskStatus::Open),
            priority: Set(data.priority),
            points: Set(data.points),
            assignment_mode: Set(data.assignment_mode),
            deadline: Set(data.deadline.map(Into::into)),
            poster_escrow: Set(data.poster_escrow),
            assignee_escrow: Set(0),
            escrow_status: Set(data.escrow_status),
            labels: Set(labels),
            repo_url: Set(data.repo_url.clone()),
            branch: Set(data.branch.clone()),
            pr_url: Set(data.pr_url.clone()),
            estimated_effort: Set(data.estimated_effort.clone()),
            acceptance_criteria: Set(data.acceptance_criteria.clone()),
            tests: Set(data.tests.clone()),
            claimed_at: Set(None),
            completed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_row_id<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        match task::Entity::find_by_id(row_id).one(db).await? {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Reads the task under a row lock (`FOR UPDATE` on backends that have one).
    pub async fn find_by_id_for_update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .lock_exclusive()
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn count_by_author<C: ConnectionTrait>(
        db: &C,
        author_row_id: i64,
    ) -> Result<u64, DbErr> {
        task::Entity::find()
            .filter(task::Column::AuthorId.eq(author_row_id))
            .count(db)
            .await
    }

    /// Filters, orders and limits in SQL. A label filter walks the ordered
    /// rows page by page and stops once `limit` tasks matched.
    pub async fn list<C: ConnectionTrait>(db: &C, filter: &TaskFilter) -> Result<Vec<Self>, DbErr> {
        let mut query = task::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(task::Column::Priority.eq(priority));
        }
        let query = order_by_sort(query, filter.sort);
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);

        let models = if filter.labels.is_empty() {
            query.limit(limit).all(db).await?
        } else {
            let mut pages = query.paginate(db, LABEL_SCAN_PAGE_SIZE);
            let mut matched = Vec::new();
            while let Some(page) = pages.fetch_and_next().await? {
                matched.extend(
                    page.into_iter()
                        .filter(|model| has_labels(model, &filter.labels)),
                );
                if matched.len() as u64 >= limit {
                    break;
                }
            }
            matched.truncate(limit as usize);
            matched
        };

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    /// Sets the assignee on an unclaimed open task.
    pub async fn claim_guarded<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        assignee_row_id: i64,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = task::Entity::update_many()
            .col_expr(task::Column::Status, Expr::value(TaskStatus::Claimed))
            .col_expr(task::Column::AssigneeId, Expr::value(assignee_row_id))
            .col_expr(task::Column::ClaimedAt, Expr::value(now))
            .col_expr(task::Column::UpdatedAt, Expr::value(now))
            .filter(task::Column::Id.eq(row_id))
            .filter(task::Column::Status.eq(TaskStatus::Open))
            .filter(task::Column::AssigneeId.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn transition_guarded<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<bool, DbErr> {
        let result = task::Entity::update_many()
            .col_expr(task::Column::Status, Expr::value(to))
            .col_expr(task::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(task::Column::Id.eq(row_id))
            .filter(task::Column::Status.eq(from))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Moves escrow from `from` to `to`, optionally recording the assignee deposit.
    pub async fn escrow_guarded<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        from: EscrowStatus,
        to: EscrowStatus,
        assignee_escrow: Option<i64>,
    ) -> Result<bool, DbErr> {
        let mut update = task::Entity::update_many()
            .col_expr(task::Column::EscrowStatus, Expr::value(to))
            .col_expr(task::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(amount) = assignee_escrow {
            update = update.col_expr(task::Column::AssigneeEscrow, Expr::value(amount));
        }
        let result = update
            .filter(task::Column::Id.eq(row_id))
            .filter(task::Column::EscrowStatus.eq(from))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Moves the task into a terminal status, guarded on both status columns.
    pub async fn close_guarded<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        expected: (TaskStatus, EscrowStatus),
        status: TaskStatus,
        escrow_status: EscrowStatus,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let mut update = task::Entity::update_many()
            .col_expr(task::Column::Status, Expr::value(status))
            .col_expr(task::Column::EscrowStatus, Expr::value(escrow_status))
            .col_expr(task::Column::UpdatedAt, Expr::value(now));
        if status == TaskStatus::Done {
            update = update.col_expr(task::Column::CompletedAt, Expr::value(now));
        }
        let result = update
            .filter(task::Column::Id.eq(row_id))
            .filter(task::Column::Status.eq(expected.0))
            .filter(task::Column::EscrowStatus.eq(expected.1))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn update_metadata<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        metadata: &TaskMetadata,
    ) -> Result<(), DbErr> {
        let record = task::Entity::find_by_id(row_id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let mut active: task::ActiveModel = record.into();
        if let Some(priority) = metadata.priority {
            active.priority = Set(priority);
        }
        if let Some(labels) = &metadata.labels {
            active.labels =
                Set(serde_json::to_value(labels).map_err(|err| DbErr::Custom(err.to_string()))?);
        }
        if let Some(repo_url) = &metadata.repo_url {
            active.repo_url = Set(repo_url.clone());
        }
        if let Some(branch) = &metadata.branch {
            active.branch = Set(branch.clone());
        }
        if let Some(pr_url) = &metadata.pr_url {
            active.pr_url = Set(pr_url.clone());
        }
        if let Some(estimated_effort) = &metadata.estimated_effort {
            active.estimated_effort = Set(estimated_effort.clone());
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
        Ok(())
    }
}

fn has_labels(model: &task::Model, wanted: &[String]) -> bool {
    let labels: Vec<String> = serde_json::from_value(model.labels.clone()).unwrap_or_default();
    wanted.iter().all(|label| labels.contains(label))
}

fn priority_rank() -> SimpleExpr {
    Expr::case(
        task::Column::Priority.eq(TaskPriority::Critical),
        Expr::val(TaskPriority::Critical.rank()),
    )
    .case(
        task::Column::Priority.eq(TaskPriority::High),
        Expr::val(TaskPriority::High.rank()),
    )
    .case(
        task::Column::Priority.eq(TaskPriority::Medium),
        Expr::val(TaskPriority::Medium.rank()),
    )
    .finally(Expr::val(TaskPriority::Low.rank()))
    .into()
}

/// 1 for done or cancelled tasks, 0 otherwise.
fn terminal_last() -> SimpleExpr {
    Expr::case(
        task::Column::Status.is_in([TaskStatus::Done, TaskStatus::Cancelled]),
        Expr::val(1),
    )
    .finally(Expr::val(0))
    .into()
}

fn order_by_sort(query: Select<task::Entity>, sort: TaskSort) -> Select<task::Entity> {
    match sort {
        TaskSort::New => query
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id),
        TaskSort::Top => query
            .order_by_desc(task::Column::Points)
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id),
        TaskSort::Urgent => query
            .order_by(priority_rank(), Order::Desc)
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id),
        TaskSort::Hot => query
            .order_by(terminal_last(), Order::Asc)
            .order_by(priority_rank(), Order::Desc)
            .order_by(
                Func::greatest([
                    Expr::col(task::Column::UpdatedAt),
                    Expr::col(task::Column::CreatedAt),
                ]),
                Order::Desc,
            )
            .order_by_desc(task::Column::Id),
    }
}
