use chrono::Utc;
use config::{Config, EconomyConfig};
use db::{
    DBService, TransactionTrait,
    models::{
        account::Account,
        comment::Comment,
        point_transaction::{PayoutRole, PointReason},
        task::{NewTask, Task, TaskFilter, TaskMetadata},
    },
    retry::retry_on_busy,
    types::{AssignmentMode, EscrowStatus, NotificationKind, TaskStatus},
};
use points::{
    EscrowManager, Ledger, MilestoneAward, MilestoneAwarder, SettlementSummary,
    bonus::early_completion_bonus, tiers::has_tier,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{Result, TaskError},
    notify::{notify, notify_arbiter, notify_counterparty},
    request::{AssignTask, CreateTask, SettleTask, UpdateTask},
};

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<MilestoneAward>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub task_id: Uuid,
    pub assignee: String,
    pub points_awarded: i64,
    pub early_bonus: i64,
    pub milestones_awarded: Vec<MilestoneAward>,
    pub milestone_bonus: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdate {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscrowAcceptance {
    pub task_id: Uuid,
    pub assignee_escrow: i64,
    pub escrow_status: EscrowStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    #[serde(flatten)]
    pub summary: SettlementSummary,
    pub task_status: TaskStatus,
    pub escrow_status: EscrowStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettleOutcome {
    pub settlement: SettlementReport,
    pub milestones_awarded: Vec<MilestoneAward>,
    pub milestone_bonus: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscrowView {
    pub task_id: Uuid,
    pub points: i64,
    pub poster: String,
    pub poster_escrow: i64,
    pub assignee: Option<String>,
    pub assignee_escrow: i64,
    pub escrow_status: EscrowStatus,
}

/// Runs every task operation in a single transaction, re-running it when the
/// store reports contention.
#[derive(Clone)]
pub struct TaskService {
    db: DBService,
    economy: EconomyConfig,
    arbiter_handle: String,
    escrow: EscrowManager,
    awarder: MilestoneAwarder,
}

impl TaskService {
    pub fn new(db: DBService, config: &Config) -> Self {
        let economy = config.economy.clone();
        Self {
            db,
            escrow: EscrowManager::new(economy.assignee_escrow_percent),
            awarder: MilestoneAwarder::new(economy.milestone_bonuses.clone()),
            arbiter_handle: config.arbiter_handle.clone(),
            economy,
        }
    }

    pub fn arbiter_handle(&self) -> &str {
        &self.arbiter_handle
    }

    pub async fn get(&self, task_id: Uuid) -> Result<Task> {
        Task::find_by_id(&self.db.pool, task_id)
            .await?
            .ok_or_else(TaskError::task_not_found)
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(Task::list(&self.db.pool, filter).await?)
    }

    pub async fn escrow(&self, task_id: Uuid) -> Result<EscrowView> {
        let task = self.get(task_id).await?;
        Ok(EscrowView {
            task_id: task.id,
            points: task.points,
            poster: task.author,
            poster_escrow: task.poster_escrow,
            assignee: task.assignee,
            assignee_escrow: task.assignee_escrow,
            escrow_status: task.escrow_status,
        })
    }

    pub async fn create(&self, actor: &Account, request: CreateTask) -> Result<CreatedTask> {
        let data = request.into_new_task()?;
        retry_on_busy(|| self.create_once(actor, &data)).await
    }

    pub async fn claim(&self, actor: &Account, task_id: Uuid) -> Result<Task> {
        retry_on_busy(|| self.claim_once(actor, task_id)).await
    }

    pub async fn assign(&self, actor: &Account, task_id: Uuid, request: &AssignTask) -> Result<Task> {
        let handle = request.handle()?;
        retry_on_busy(|| self.assign_once(actor, task_id, &handle)).await
    }

    pub async fn accept_escrow(&self, actor: &Account, task_id: Uuid) -> Result<EscrowAcceptance> {
        retry_on_busy(|| self.accept_escrow_once(actor, task_id)).await
    }

    /// Generic PATCH: metadata edits plus an optional status move.
    pub async fn update(
        &self,
        actor: &Account,
        task_id: Uuid,
        request: &UpdateTask,
    ) -> Result<TaskUpdate> {
        let metadata = request.metadata()?;
        retry_on_busy(|| self.update_once(actor, task_id, request.status, &metadata)).await
    }

    pub async fn cancel(&self, actor: &Account, task_id: Uuid) -> Result<Task> {
        retry_on_busy(|| self.cancel_once(actor, task_id)).await
    }

    pub async fn complete(&self, actor: &Account, task_id: Uuid) -> Result<Completion> {
        retry_on_busy(|| self.complete_once(actor, task_id)).await
    }

    pub async fn settle(
        &self,
        actor: &Account,
        task_id: Uuid,
        request: &SettleTask,
    ) -> Result<SettleOutcome> {
        retry_on_busy(|| self.settle_once(actor, task_id, request)).await
    }

    pub async fn add_comment(&self, actor: &Account, task_id: Uuid, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TaskError::Validation("content is required.".to_string()));
        }
        let task = self.get(task_id).await?;
        let comment =
            Comment::create(&self.db.pool, task.row_id, actor.row_id, content, Uuid::new_v4())
                .await?;
        tracing::debug!(task_id = %task.id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    pub async fn comments(&self, task_id: Uuid) -> Result<Vec<Comment>> {
        let task = self.get(task_id).await?;
        Ok(Comment::list_for_task(&self.db.pool, task.row_id).await?)
    }

    async fn create_once(&self, actor: &Account, data: &NewTask) -> Result<CreatedTask> {
        let txn = self.db.pool.begin().await?;
        let created = self.create_in(&txn, actor, data).await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn claim_once(&self, actor: &Account, task_id: Uuid) -> Result<Task> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let claimed = self.claim_in(&txn, actor, task).await?;
        txn.commit().await?;
        Ok(claimed)
    }

    async fn assign_once(&self, actor: &Account, task_id: Uuid, handle: &str) -> Result<Task> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let assigned = self.assign_in(&txn, actor, task, handle).await?;
        txn.commit().await?;
        Ok(assigned)
    }

    async fn accept_escrow_once(&self, actor: &Account, task_id: Uuid) -> Result<EscrowAcceptance> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let accepted = self.accept_escrow_in(&txn, actor, task).await?;
        txn.commit().await?;
        Ok(accepted)
    }

    async fn update_once(
        &self,
        actor: &Account,
        task_id: Uuid,
        status: Option<TaskStatus>,
        metadata: &TaskMetadata,
    ) -> Result<TaskUpdate> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let updated = self.update_in(&txn, actor, task, status, metadata).await?;
        txn.commit().await?;
        Ok(updated)
    }

    async fn cancel_once(&self, actor: &Account, task_id: Uuid) -> Result<Task> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let cancelled = self.cancel_in(&txn, actor, task).await?;
        txn.commit().await?;
        Ok(cancelled)
    }

    async fn complete_once(&self, actor: &Account, task_id: Uuid) -> Result<Completion> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let completion = self.complete_in(&txn, actor, task).await?;
        txn.commit().await?;
        Ok(completion)
    }

    async fn settle_once(
        &self,
        actor: &Account,
        task_id: Uuid,
        request: &SettleTask,
    ) -> Result<SettleOutcome> {
        let txn = self.db.pool.begin().await?;
        let task = load(&txn, task_id).await?;
        let outcome = self.settle_in(&txn, actor, task, request).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        data: &NewTask,
    ) -> Result<CreatedTask> {
        if data.escrow_status == EscrowStatus::PosterHeld {
            let poster = Account::find_by_row_id_for_update(conn, actor.row_id)
                .await?
                .ok_or_else(|| TaskError::NotFound("Account not found.".to_string()))?;
            let required = self.economy.escrow_min_tier;
            if !has_tier(poster.total_points, required, &self.economy.tiers) {
                return Err(TaskError::Forbidden(format!(
                    "Escrow tasks require {required} tier or higher ({} points). You have {}.",
                    self.economy.tiers.minimum(required),
                    poster.total_points
                )));
            }
        }

        let task = Task::create(conn, data, actor.row_id, Uuid::new_v4()).await?;
        if task.escrow_status == EscrowStatus::PosterHeld {
            self.escrow.hold_poster(conn, &task).await?;
        }
        let milestone = self
            .awarder
            .on_task_posted(conn, actor.row_id, task.row_id)
            .await?;
        tracing::info!(
            task_id = %task.id,
            author = %actor.handle,
            points = task.points,
            escrow = %task.escrow_status,
            "task created"
        );
        Ok(CreatedTask { task, milestone })
    }

    async fn claim_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
    ) -> Result<Task> {
        if task.author_row_id == actor.row_id {
            return Err(TaskError::Forbidden(
                "You cannot claim your own task.".to_string(),
            ));
        }
        if task.assignment_mode != AssignmentMode::Fcfs {
            return Err(TaskError::Forbidden(format!(
                "This task is assigned by its owner. Ask @{} to assign it to you.",
                task.author
            )));
        }
        if task.status != TaskStatus::Open || task.assignee_row_id.is_some() {
            return Err(TaskError::Conflict(format!(
                "Task is '{}' and can no longer be claimed.",
                task.status
            )));
        }
        if !Task::claim_guarded(conn, task.row_id, actor.row_id).await? {
            return Err(TaskError::Conflict(
                "Task was claimed by someone else.".to_string(),
            ));
        }
        if task.escrow_status == EscrowStatus::PosterHeld {
            self.escrow.hold_assignee(conn, &task, actor.row_id).await?;
        }

        let claimed = reload(conn, task.row_id).await?;
        notify(
            conn,
            claimed.author_row_id,
            &claimed.author,
            actor,
            NotificationKind::TaskClaimed,
            &claimed,
            None,
        )
        .await?;
        notify_arbiter(
            conn,
            &self.arbiter_handle,
            actor,
            NotificationKind::TaskClaimed,
            &claimed,
            None,
        )
        .await?;
        tracing::info!(
            task_id = %claimed.id,
            assignee = %actor.handle,
            escrow = %claimed.escrow_status,
            "task claimed"
        );
        Ok(claimed)
    }

    async fn assign_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
        handle: &str,
    ) -> Result<Task> {
        if task.author_row_id != actor.row_id {
            return Err(TaskError::Forbidden(
                "Only the task owner can assign it.".to_string(),
            ));
        }
        if task.status != TaskStatus::Open || task.assignee_row_id.is_some() {
            return Err(TaskError::Conflict(format!(
                "Task is '{}'. Only open, unassigned tasks can be assigned.",
                task.status
            )));
        }
        let target = Account::find_by_handle(conn, handle)
            .await?
            .ok_or_else(|| TaskError::NotFound(format!("User @{handle} not found.")))?;
        if target.row_id == task.author_row_id {
            return Err(TaskError::Validation(
                "You cannot assign a task to yourself.".to_string(),
            ));
        }
        if !Task::claim_guarded(conn, task.row_id, target.row_id).await? {
            return Err(TaskError::Conflict(
                "Task was claimed by someone else.".to_string(),
            ));
        }

        let assigned = reload(conn, task.row_id).await?;
        notify(
            conn,
            target.row_id,
            &target.handle,
            actor,
            NotificationKind::TaskAssigned,
            &assigned,
            None,
        )
        .await?;
        notify_arbiter(
            conn,
            &self.arbiter_handle,
            actor,
            NotificationKind::TaskAssigned,
            &assigned,
            Some(format!("assigned to @{}", target.handle)),
        )
        .await?;
        tracing::info!(task_id = %assigned.id, assignee = %target.handle, "task assigned");
        Ok(assigned)
    }

    async fn accept_escrow_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
    ) -> Result<EscrowAcceptance> {
        if task.assignee_row_id != Some(actor.row_id) {
            return Err(TaskError::Forbidden(
                "Only the assigned user can accept escrow.".to_string(),
            ));
        }
        if task.escrow_status != EscrowStatus::PosterHeld {
            return Err(TaskError::Conflict(format!(
                "Cannot accept escrow when escrow_status is '{}'. Expected 'poster_held'.",
                task.escrow_status
            )));
        }
        let deposit = self.escrow.hold_assignee(conn, &task, actor.row_id).await?;

        let accepted = reload(conn, task.row_id).await?;
        notify(
            conn,
            accepted.author_row_id,
            &accepted.author,
            actor,
            NotificationKind::EscrowAccepted,
            &accepted,
            Some(format!("{deposit} points deposited")),
        )
        .await?;
        tracing::info!(task_id = %accepted.id, assignee = %actor.handle, deposit, "escrow accepted");
        Ok(EscrowAcceptance {
            task_id: accepted.id,
            assignee_escrow: deposit,
            escrow_status: accepted.escrow_status,
        })
    }

    async fn update_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        mut task: Task,
        status: Option<TaskStatus>,
        metadata: &TaskMetadata,
    ) -> Result<TaskUpdate> {
        // Self-claim: there is no assignee to check against yet.
        if status == Some(TaskStatus::Claimed) && task.assignee_row_id.is_none() {
            task = self.claim_in(conn, actor, task).await?;
        } else if !is_participant(actor, &task) {
            return Err(TaskError::Forbidden(
                "Only the task owner or assignee can update this task.".to_string(),
            ));
        }

        if !metadata.is_empty() {
            Task::update_metadata(conn, task.row_id, metadata).await?;
        }

        let mut completion = None;
        match status {
            None => {}
            Some(next) if next == task.status => {}
            Some(TaskStatus::Done) => {
                if !task.status.can_transition_to(TaskStatus::Done) {
                    return Err(TaskError::invalid_transition(task.status, TaskStatus::Done));
                }
                if task.escrow_status != EscrowStatus::None {
                    return Err(TaskError::Conflict(format!(
                        "This task uses escrow. Ask @{} to settle it instead.",
                        self.arbiter_handle
                    )));
                }
                completion = Some(self.complete_in(conn, actor, task.clone()).await?);
            }
            Some(TaskStatus::Cancelled) => {
                self.cancel_in(conn, actor, task.clone()).await?;
            }
            Some(next) => {
                if !task.status.can_transition_to(next) {
                    return Err(TaskError::invalid_transition(task.status, next));
                }
                if task.assignee_row_id.is_none() {
                    return Err(TaskError::Conflict(format!(
                        "Task needs an assignee before moving to '{next}'."
                    )));
                }
                if !Task::transition_guarded(conn, task.row_id, task.status, next).await? {
                    return Err(TaskError::Conflict(
                        "Task status changed concurrently. Reload and retry.".to_string(),
                    ));
                }
                if next == TaskStatus::InReview {
                    let reviewed = reload(conn, task.row_id).await?;
                    notify_counterparty(conn, actor, NotificationKind::TaskInReview, &reviewed, None)
                        .await?;
                    notify_arbiter(
                        conn,
                        &self.arbiter_handle,
                        actor,
                        NotificationKind::TaskInReview,
                        &reviewed,
                        None,
                    )
                    .await?;
                }
                tracing::info!(
                    task_id = %task.id,
                    from = %task.status,
                    to = %next,
                    actor = %actor.handle,
                    "task status changed"
                );
            }
        }

        let task = reload(conn, task.row_id).await?;
        Ok(TaskUpdate { task, completion })
    }

    async fn cancel_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
    ) -> Result<Task> {
        if !is_participant(actor, &task) {
            return Err(TaskError::Forbidden(
                "Only the task owner or assignee can cancel this task.".to_string(),
            ));
        }
        if !task.status.can_transition_to(TaskStatus::Cancelled) {
            return Err(TaskError::invalid_transition(
                task.status,
                TaskStatus::Cancelled,
            ));
        }
        if task.escrow_status == EscrowStatus::BothHeld
            && task.assignee_row_id != Some(actor.row_id)
        {
            return Err(TaskError::Forbidden(
                "Cannot cancel after assignee has accepted escrow. Only the assignee can abandon."
                    .to_string(),
            ));
        }

        let escrow_after = if task.escrow_status.is_held() {
            self.escrow.release_on_cancel(conn, &task).await?;
            EscrowStatus::Refunded
        } else {
            task.escrow_status
        };
        if !Task::close_guarded(
            conn,
            task.row_id,
            (task.status, task.escrow_status),
            TaskStatus::Cancelled,
            escrow_after,
        )
        .await?
        {
            return Err(TaskError::Conflict(
                "Task changed concurrently. Reload and retry.".to_string(),
            ));
        }

        let cancelled = reload(conn, task.row_id).await?;
        notify_counterparty(conn, actor, NotificationKind::TaskCancelled, &cancelled, None)
            .await?;
        notify_arbiter(
            conn,
            &self.arbiter_handle,
            actor,
            NotificationKind::TaskCancelled,
            &cancelled,
            None,
        )
        .await?;
        tracing::info!(
            task_id = %cancelled.id,
            actor = %actor.handle,
            escrow = %cancelled.escrow_status,
            "task cancelled"
        );
        Ok(cancelled)
    }

    async fn complete_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
    ) -> Result<Completion> {
        if task.author_row_id != actor.row_id {
            return Err(TaskError::Forbidden(
                "Only the task owner can mark it complete.".to_string(),
            ));
        }
        if task.status.is_terminal() {
            return Err(TaskError::Conflict(format!(
                "Task is already {}.",
                task.status
            )));
        }
        let (Some(assignee_row_id), Some(assignee)) =
            (task.assignee_row_id, task.assignee.clone())
        else {
            return Err(TaskError::Conflict(
                "Task has no assignee to pay.".to_string(),
            ));
        };
        if task.escrow_status != EscrowStatus::None {
            return Err(TaskError::Conflict(format!(
                "This task uses escrow. Ask @{} to settle it instead.",
                self.arbiter_handle
            )));
        }

        Ledger::debit(
            conn,
            task.author_row_id,
            Some(task.row_id),
            task.points,
            PointReason::BountyPayout {
                role: PayoutRole::Payer,
            },
        )
        .await?;
        Ledger::credit(
            conn,
            assignee_row_id,
            Some(task.row_id),
            task.points,
            PointReason::BountyPayout {
                role: PayoutRole::Payee,
            },
        )
        .await?;
        if !Task::close_guarded(
            conn,
            task.row_id,
            (task.status, EscrowStatus::None),
            TaskStatus::Done,
            EscrowStatus::None,
        )
        .await?
        {
            return Err(TaskError::Conflict(
                "Task changed concurrently. Reload and retry.".to_string(),
            ));
        }

        let percent = self.economy.early_completion_bonus_percent;
        let early_bonus = task
            .deadline
            .map(|deadline| {
                early_completion_bonus(task.points, percent, task.created_at, deadline, Utc::now())
            })
            .unwrap_or(0);
        if early_bonus > 0 {
            Ledger::credit(
                conn,
                assignee_row_id,
                Some(task.row_id),
                early_bonus,
                PointReason::EarlyCompletionBonus {
                    bounty: task.points,
                    percent,
                },
            )
            .await?;
        }
        let milestones = self
            .awarder
            .on_task_completed(conn, assignee_row_id, task.row_id)
            .await?;
        let milestone_bonus: i64 = milestones.iter().map(|award| award.points).sum();

        let done = reload(conn, task.row_id).await?;
        notify(
            conn,
            assignee_row_id,
            &assignee,
            actor,
            NotificationKind::TaskCompleted,
            &done,
            Some(format!("+{} points", task.points + early_bonus)),
        )
        .await?;
        tracing::info!(
            task_id = %done.id,
            assignee = %assignee,
            points = task.points,
            early_bonus,
            milestone_bonus,
            "task completed"
        );
        Ok(Completion {
            task_id: done.id,
            assignee,
            points_awarded: task.points,
            early_bonus,
            milestones_awarded: milestones,
            milestone_bonus,
        })
    }

    async fn settle_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Account,
        task: Task,
        request: &SettleTask,
    ) -> Result<SettleOutcome> {
        if actor.handle != self.arbiter_handle {
            return Err(TaskError::Forbidden(format!(
                "Only @{} can settle escrow tasks.",
                self.arbiter_handle
            )));
        }
        if task.status.is_terminal() {
            return Err(TaskError::Conflict(format!(
                "Task is already {}.",
                task.status
            )));
        }
        let (Some(assignee_row_id), Some(assignee)) =
            (task.assignee_row_id, task.assignee.clone())
        else {
            return Err(TaskError::Validation(
                "Task has no assignee to settle with.".to_string(),
            ));
        };
        if !task.escrow_status.is_held() {
            return Err(TaskError::Conflict(format!(
                "Cannot settle when escrow_status is '{}'.",
                task.escrow_status
            )));
        }
        let settlement = request.settlement()?;
        let reason = request.reason();

        self.escrow
            .settle(conn, &task, assignee_row_id, &settlement)
            .await?;
        if !Task::close_guarded(
            conn,
            task.row_id,
            (task.status, task.escrow_status),
            TaskStatus::Done,
            EscrowStatus::Settled,
        )
        .await?
        {
            return Err(TaskError::Conflict(
                "Task changed concurrently. Reload and retry.".to_string(),
            ));
        }

        let milestones = if settlement.assignee_payout > 0 {
            self.awarder
                .on_task_completed(conn, assignee_row_id, task.row_id)
                .await?
        } else {
            Vec::new()
        };
        let milestone_bonus: i64 = milestones.iter().map(|award| award.points).sum();

        let settled = reload(conn, task.row_id).await?;
        for (row_id, handle) in [
            (assignee_row_id, assignee.as_str()),
            (settled.author_row_id, settled.author.as_str()),
        ] {
            notify(
                conn,
                row_id,
                handle,
                actor,
                NotificationKind::TaskSettled,
                &settled,
                Some(reason.clone()),
            )
            .await?;
        }
        tracing::info!(
            task_id = %settled.id,
            assignee_received = settlement.assignee_received(),
            poster_received = settlement.poster_received(),
            %reason,
            "escrow settled"
        );

        Ok(SettleOutcome {
            settlement: SettlementReport {
                summary: SettlementSummary {
                    assignee_handle: assignee,
                    assignee_received: settlement.assignee_received(),
                    poster_handle: settled.author.clone(),
                    poster_received: settlement.poster_received(),
                },
                task_status: settled.status,
                escrow_status: settled.escrow_status,
                reason,
            },
            milestones_awarded: milestones,
            milestone_bonus,
        })
    }
}

fn is_participant(actor: &Account, task: &Task) -> bool {
    task.author_row_id == actor.row_id || task.assignee_row_id == Some(actor.row_id)
}

async fn load<C: ConnectionTrait>(conn: &C, task_id: Uuid) -> Result<Task> {
    Task::find_by_id_for_update(conn, task_id)
        .await?
        .ok_or_else(TaskError::task_not_found)
}

async fn reload<C: ConnectionTrait>(conn: &C, row_id: i64) -> Result<Task> {
    Task::find_by_row_id(conn, row_id)
        .await?
        .ok_or_else(TaskError::task_not_found)
}

#[cfg(test)]
mod tests;
