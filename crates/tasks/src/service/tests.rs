use chrono::Duration;
use config::{Config, MilestoneBonuses};
use db::{
    models::{notification_outbox::NotificationOutbox, point_transaction::PointTransaction},
    types::{MilestoneKind, TransactionKind},
};
use test_support::{
    assert_ledger_reconciles, balance_of, seed_account, setup_db, setup_file_db,
};

use super::*;

struct Hive {
    db: DBService,
    service: TaskService,
    poster: Account,
    worker: Account,
    arbiter: Account,
}

impl Hive {
    async fn reconciles(&self) {
        for account in [&self.poster, &self.worker, &self.arbiter] {
            assert_ledger_reconciles(&self.db, account.row_id).await;
        }
    }
}

async fn hive_with(config: Config, poster_points: i64, worker_points: i64) -> Hive {
    let db = setup_db().await;
    let poster = seed_account(&db, "poster", poster_points).await;
    let worker = seed_account(&db, "worker", worker_points).await;
    let arbiter = seed_account(&db, "queenbee", 0).await;
    Hive {
        service: TaskService::new(db.clone(), &config),
        db,
        poster,
        worker,
        arbiter,
    }
}

async fn hive(poster_points: i64, worker_points: i64) -> Hive {
    hive_with(Config::default(), poster_points, worker_points).await
}

fn request(points: i64, mode: AssignmentMode, escrow: bool) -> CreateTask {
    CreateTask {
        title: Some("Fix the hive door".to_string()),
        content: Some("It squeaks.".to_string()),
        points: Some(points),
        assignment_mode: Some(mode),
        escrow,
        ..Default::default()
    }
}

fn status(status: TaskStatus) -> UpdateTask {
    UpdateTask {
        status: Some(status),
        ..Default::default()
    }
}

fn even_split(poster_escrow: i64, assignee_escrow: i64) -> SettleTask {
    SettleTask {
        assignee_payout: Some(poster_escrow),
        poster_refund: Some(0),
        assignee_escrow_return: Some(assignee_escrow),
        assignee_escrow_penalty: Some(0),
        reason: None,
    }
}

#[tokio::test]
async fn first_post_awards_milestone_once() {
    let h = hive(0, 0).await;
    let first = h
        .service
        .create(&h.poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap();
    let award = first.milestone.unwrap();
    assert_eq!(award.milestone, MilestoneKind::FirstTaskPosted);
    assert_eq!(award.points, 5);
    assert_eq!(first.task.status, TaskStatus::Open);
    assert_eq!(first.task.escrow_status, EscrowStatus::None);

    let second = h
        .service
        .create(&h.poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap();
    assert!(second.milestone.is_none());
    assert_eq!(balance_of(&h.db, &h.poster).await, 5);
    h.reconciles().await;
}

#[tokio::test]
async fn escrow_creation_is_tier_gated_and_debits_poster() {
    let h = hive(150, 50).await;

    let err = h
        .service
        .create(&h.worker, request(10, AssignmentMode::Fcfs, true))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let created = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap();
    assert_eq!(created.task.escrow_status, EscrowStatus::PosterHeld);
    assert_eq!(created.task.poster_escrow, 100);
    // 150 - 100 escrow + 5 first post
    assert_eq!(balance_of(&h.db, &h.poster).await, 55);
    h.reconciles().await;
}

#[tokio::test]
async fn escrow_creation_beyond_balance_rolls_back() {
    let h = hive(120, 0).await;
    let err = h
        .service
        .create(&h.poster, request(500, AssignmentMode::Fcfs, true))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TaskError::InsufficientPoints {
            needed: 500,
            available: 120
        }
    ));
    assert!(
        h.service
            .list(&TaskFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(balance_of(&h.db, &h.poster).await, 120);
}

#[tokio::test]
async fn escrow_task_end_to_end_settlement() {
    let mut config = Config::default();
    config.economy.milestone_bonuses = MilestoneBonuses {
        first_task_posted: 0,
        first_task_completed: 0,
        five_completions: 0,
        ten_completions: 0,
    };
    let h = hive_with(config, 200, 10).await;

    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;
    assert_eq!(balance_of(&h.db, &h.poster).await, 100);

    let claimed = h.service.claim(&h.worker, task.id).await.unwrap();
    assert_eq!(claimed.status, TaskStatus::Claimed);
    assert_eq!(claimed.escrow_status, EscrowStatus::BothHeld);
    assert_eq!(claimed.assignee_escrow, 10);
    assert_eq!(balance_of(&h.db, &h.worker).await, 0);

    let poster_before = balance_of(&h.db, &h.poster).await;
    let worker_before = balance_of(&h.db, &h.worker).await;
    let outcome = h
        .service
        .settle(
            &h.arbiter,
            task.id,
            &SettleTask {
                assignee_payout: Some(90),
                poster_refund: Some(10),
                assignee_escrow_return: Some(10),
                assignee_escrow_penalty: Some(0),
                reason: Some("Shipped, minor gaps".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.settlement.summary.assignee_received, 100);
    assert_eq!(outcome.settlement.summary.poster_received, 10);
    assert_eq!(outcome.settlement.summary.poster_handle, "poster");
    assert_eq!(outcome.settlement.task_status, TaskStatus::Done);
    assert_eq!(outcome.settlement.escrow_status, EscrowStatus::Settled);
    assert_eq!(outcome.settlement.reason, "Shipped, minor gaps");
    assert_eq!(balance_of(&h.db, &h.worker).await - worker_before, 100);
    assert_eq!(balance_of(&h.db, &h.poster).await - poster_before, 10);

    let settled = h.service.get(task.id).await.unwrap();
    assert_eq!(settled.status, TaskStatus::Done);
    assert_eq!(settled.escrow_status, EscrowStatus::Settled);
    assert!(settled.completed_at.is_some());

    let err = h
        .service
        .settle(&h.arbiter, task.id, &even_split(100, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));
    h.reconciles().await;
}

#[tokio::test]
async fn settlement_guards_run_before_any_mutation() {
    let h = hive(200, 50).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;

    let err = h
        .service
        .settle(&h.arbiter, task.id, &even_split(100, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));

    h.service.claim(&h.worker, task.id).await.unwrap();
    let worker_before = balance_of(&h.db, &h.worker).await;

    let err = h
        .service
        .settle(&h.poster, task.id, &even_split(100, 10))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only @queenbee can settle escrow tasks.");

    let err = h
        .service
        .settle(
            &h.arbiter,
            task.id,
            &SettleTask {
                assignee_payout: Some(95),
                poster_refund: Some(10),
                assignee_escrow_return: Some(10),
                assignee_escrow_penalty: Some(0),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Conservation(_)));
    assert!(err.to_string().contains("must equal poster_escrow (100)"));

    let unchanged = h.service.get(task.id).await.unwrap();
    assert_eq!(unchanged.escrow_status, EscrowStatus::BothHeld);
    assert_eq!(balance_of(&h.db, &h.worker).await, worker_before);
    h.reconciles().await;
}

#[tokio::test]
async fn zero_payout_settlement_skips_milestones() {
    let h = hive(200, 50).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();

    let outcome = h
        .service
        .settle(
            &h.arbiter,
            task.id,
            &SettleTask {
                assignee_payout: Some(0),
                poster_refund: Some(100),
                assignee_escrow_return: Some(0),
                assignee_escrow_penalty: Some(10),
                reason: None,
            },
        )
        .await
        .unwrap();
    assert!(outcome.milestones_awarded.is_empty());
    assert_eq!(outcome.settlement.summary.poster_received, 110);
    assert_eq!(outcome.settlement.reason, "Settlement");
    // 200 - 100 + 5 first post + 110 back
    assert_eq!(balance_of(&h.db, &h.poster).await, 215);
    assert_eq!(balance_of(&h.db, &h.worker).await, 40);
    h.reconciles().await;
}

#[tokio::test]
async fn claim_guards() {
    let h = hive(0, 0).await;
    let fcfs = h
        .service
        .create(&h.poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;
    let owner_assigns = h
        .service
        .create(&h.poster, request(5, AssignmentMode::OwnerAssigns, false))
        .await
        .unwrap()
        .task;

    let err = h.service.claim(&h.poster, fcfs.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));
    let err = h
        .service
        .claim(&h.worker, owner_assigns.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let claimed = h.service.claim(&h.worker, fcfs.id).await.unwrap();
    assert_eq!(claimed.assignee.as_deref(), Some("worker"));
    assert!(claimed.claimed_at.is_some());

    let err = h.service.claim(&h.arbiter, fcfs.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));
    let err = h.service.claim(&h.worker, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TaskError::NotFound(_)));
}

#[tokio::test]
async fn claim_without_escrow_funds_rolls_back() {
    let h = hive(200, 4).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;

    let err = h.service.claim(&h.worker, task.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insufficient points. You need 10 points but have 4."
    );
    let still_open = h.service.get(task.id).await.unwrap();
    assert_eq!(still_open.status, TaskStatus::Open);
    assert!(still_open.assignee.is_none());
    assert_eq!(still_open.escrow_status, EscrowStatus::PosterHeld);
    assert_eq!(balance_of(&h.db, &h.worker).await, 4);
}

#[tokio::test]
async fn assign_then_accept_escrow() {
    let h = hive(200, 30).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::OwnerAssigns, true))
        .await
        .unwrap()
        .task;
    let assign = |handle: &str| AssignTask {
        handle: Some(handle.to_string()),
    };

    let err = h
        .service
        .assign(&h.worker, task.id, &assign("worker"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));
    let err = h
        .service
        .assign(&h.poster, task.id, &assign("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::NotFound(_)));
    let err = h
        .service
        .assign(&h.poster, task.id, &assign("poster"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));

    let assigned = h
        .service
        .assign(&h.poster, task.id, &assign("@worker"))
        .await
        .unwrap();
    assert_eq!(assigned.status, TaskStatus::Claimed);
    assert_eq!(assigned.escrow_status, EscrowStatus::PosterHeld);
    assert_eq!(balance_of(&h.db, &h.worker).await, 30);

    let err = h
        .service
        .assign(&h.poster, task.id, &assign("queenbee"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));

    let err = h
        .service
        .accept_escrow(&h.arbiter, task.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only the assigned user can accept escrow.");

    let accepted = h.service.accept_escrow(&h.worker, task.id).await.unwrap();
    assert_eq!(accepted.assignee_escrow, 10);
    assert_eq!(accepted.escrow_status, EscrowStatus::BothHeld);
    assert_eq!(balance_of(&h.db, &h.worker).await, 20);

    let err = h
        .service
        .accept_escrow(&h.worker, task.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot accept escrow when escrow_status is 'both_held'. Expected 'poster_held'."
    );
    h.reconciles().await;
}

#[tokio::test]
async fn patch_follows_the_transition_table() {
    let h = hive(100, 0).await;
    let task = h
        .service
        .create(&h.poster, request(50, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;

    let err = h
        .service
        .update(&h.worker, task.id, &status(TaskStatus::InProgress))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    // Self-claim through PATCH.
    let claimed = h
        .service
        .update(&h.worker, task.id, &status(TaskStatus::Claimed))
        .await
        .unwrap()
        .task;
    assert_eq!(claimed.assignee.as_deref(), Some("worker"));

    let err = h
        .service
        .update(&h.poster, task.id, &status(TaskStatus::Done))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid status transition from 'claimed' to 'done'."
    );
    let err = h
        .service
        .update(&h.arbiter, task.id, &status(TaskStatus::InProgress))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let same = h
        .service
        .update(&h.worker, task.id, &status(TaskStatus::Claimed))
        .await
        .unwrap();
    assert_eq!(same.task.status, TaskStatus::Claimed);

    for next in [TaskStatus::InProgress, TaskStatus::InReview] {
        let moved = h
            .service
            .update(&h.worker, task.id, &status(next))
            .await
            .unwrap();
        assert_eq!(moved.task.status, next);
        assert!(moved.completion.is_none());
    }

    let err = h
        .service
        .update(&h.worker, task.id, &status(TaskStatus::Done))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only the task owner can mark it complete.");

    let done = h
        .service
        .update(&h.poster, task.id, &status(TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(done.task.status, TaskStatus::Done);
    let completion = done.completion.unwrap();
    assert_eq!(completion.points_awarded, 50);
    assert_eq!(completion.early_bonus, 0);
    assert_eq!(completion.milestone_bonus, 10);

    let err = h
        .service
        .update(&h.poster, task.id, &status(TaskStatus::Cancelled))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));
    h.reconciles().await;
}

#[tokio::test]
async fn patch_edits_metadata_and_rejects_done_on_escrow() {
    let h = hive(200, 20).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();

    let edited = h
        .service
        .update(
            &h.worker,
            task.id,
            &UpdateTask {
                status: Some(TaskStatus::InProgress),
                priority: Some(db::types::TaskPriority::High),
                labels: Some(vec!["Backend".to_string(), "backend".to_string()]),
                branch: Some("fix/door".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .task;
    assert_eq!(edited.status, TaskStatus::InProgress);
    assert_eq!(edited.priority, db::types::TaskPriority::High);
    assert_eq!(edited.labels, vec!["backend".to_string()]);
    assert_eq!(edited.branch.as_deref(), Some("fix/door"));

    h.service
        .update(&h.worker, task.id, &status(TaskStatus::InReview))
        .await
        .unwrap();
    let err = h
        .service
        .update(&h.poster, task.id, &status(TaskStatus::Done))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Conflict(m) if m.contains("@queenbee")));

    let err = h.service.complete(&h.poster, task.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));
}

#[tokio::test]
async fn poster_cannot_cancel_after_assignee_deposit() {
    let h = hive(200, 20).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();

    let err = h.service.cancel(&h.poster, task.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot cancel after assignee has accepted escrow. Only the assignee can abandon."
    );

    let poster_before = balance_of(&h.db, &h.poster).await;
    let abandoned = h.service.cancel(&h.worker, task.id).await.unwrap();
    assert_eq!(abandoned.status, TaskStatus::Cancelled);
    assert_eq!(abandoned.escrow_status, EscrowStatus::Refunded);
    assert_eq!(balance_of(&h.db, &h.poster).await - poster_before, 110);
    assert_eq!(balance_of(&h.db, &h.worker).await, 10);

    let kinds: Vec<TransactionKind> = PointTransaction::list_for_task(&h.db.pool, task.row_id)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.reason)
        .collect();
    assert!(kinds.contains(&TransactionKind::EscrowForfeit));
    assert!(kinds.contains(&TransactionKind::Refund));
    h.reconciles().await;
}

#[tokio::test]
async fn poster_cancel_refunds_poster_held_escrow() {
    let h = hive(200, 0).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::OwnerAssigns, true))
        .await
        .unwrap()
        .task;

    let err = h.service.cancel(&h.poster, task.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid status transition from 'open' to 'cancelled'."
    );

    h.service
        .assign(
            &h.poster,
            task.id,
            &AssignTask {
                handle: Some("worker".to_string()),
            },
        )
        .await
        .unwrap();
    let err = h.service.cancel(&h.arbiter, task.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let cancelled = h.service.cancel(&h.poster, task.id).await.unwrap();
    assert_eq!(cancelled.escrow_status, EscrowStatus::Refunded);
    assert_eq!(balance_of(&h.db, &h.poster).await, 205);
    h.reconciles().await;
}

#[tokio::test]
async fn plain_cancel_keeps_escrow_none() {
    let h = hive(0, 0).await;
    let task = h
        .service
        .create(&h.poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();
    let cancelled = h
        .service
        .update(&h.worker, task.id, &status(TaskStatus::Cancelled))
        .await
        .unwrap()
        .task;
    assert_eq!(cancelled.status, TaskStatus::Cancelled);
    assert_eq!(cancelled.escrow_status, EscrowStatus::None);
}

#[tokio::test]
async fn complete_pays_bounty_bonus_and_milestones() {
    let h = hive(100, 0).await;
    let mut early = request(50, AssignmentMode::Fcfs, false);
    early.deadline = Some(Utc::now() + Duration::days(10));
    let task = h.service.create(&h.poster, early).await.unwrap().task;

    let err = h.service.complete(&h.poster, task.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Conflict(_)));

    h.service.claim(&h.worker, task.id).await.unwrap();
    let err = h.service.complete(&h.worker, task.id).await.unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let completion = h.service.complete(&h.poster, task.id).await.unwrap();
    assert_eq!(completion.points_awarded, 50);
    assert_eq!(completion.early_bonus, 5);
    assert_eq!(completion.milestone_bonus, 10);
    assert_eq!(
        completion.milestones_awarded[0].milestone,
        MilestoneKind::FirstTaskCompleted
    );
    // 100 + 5 first post - 50
    assert_eq!(balance_of(&h.db, &h.poster).await, 55);
    assert_eq!(balance_of(&h.db, &h.worker).await, 65);

    let err = h.service.complete(&h.poster, task.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Task is already done.");
    h.reconciles().await;
}

#[tokio::test]
async fn complete_without_poster_funds_rolls_back() {
    let h = hive(0, 0).await;
    let task = h
        .service
        .create(&h.poster, request(50, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();

    let err = h.service.complete(&h.poster, task.id).await.unwrap_err();
    assert!(matches!(
        err,
        TaskError::InsufficientPoints {
            needed: 50,
            available: 5
        }
    ));
    let task = h.service.get(task.id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Claimed);
    assert_eq!(balance_of(&h.db, &h.worker).await, 0);
    h.reconciles().await;
}

#[tokio::test]
async fn lifecycle_queues_notifications() {
    let h = hive(100, 0).await;
    let task = h
        .service
        .create(&h.poster, request(10, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;
    h.service.claim(&h.worker, task.id).await.unwrap();

    let pending = NotificationOutbox::fetch_pending(&h.db.pool, 100, 5)
        .await
        .unwrap();
    let recipients: Vec<(i64, NotificationKind)> = pending
        .iter()
        .map(|row| (row.recipient_id, row.kind))
        .collect();
    assert!(recipients.contains(&(h.poster.row_id, NotificationKind::TaskClaimed)));
    assert!(recipients.contains(&(h.arbiter.row_id, NotificationKind::TaskClaimed)));
    assert!(!recipients.iter().any(|(row, _)| *row == h.worker.row_id));
}

#[tokio::test]
async fn comments_need_content_and_a_task() {
    let h = hive(0, 0).await;
    let task = h
        .service
        .create(&h.poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;
    assert!(matches!(
        h.service.add_comment(&h.worker, task.id, "  ").await,
        Err(TaskError::Validation(_))
    ));
    assert!(matches!(
        h.service.add_comment(&h.worker, Uuid::new_v4(), "hi").await,
        Err(TaskError::NotFound(_))
    ));
    let comment = h
        .service
        .add_comment(&h.worker, task.id, "On it")
        .await
        .unwrap();
    assert_eq!(comment.author, "worker");
    assert_eq!(h.service.comments(task.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_claims_have_one_winner() {
    let (_dir, db) = setup_file_db().await;
    let poster = seed_account(&db, "poster", 0).await;
    let mut claimants = Vec::new();
    for handle in ["a", "b", "c", "d"] {
        claimants.push(seed_account(&db, handle, 0).await);
    }
    let service = TaskService::new(db.clone(), &Config::default());
    let task = service
        .create(&poster, request(5, AssignmentMode::Fcfs, false))
        .await
        .unwrap()
        .task;

    let results =
        futures::future::join_all(claimants.iter().map(|who| service.claim(who, task.id))).await;
    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(matches!(result, TaskError::Conflict(_)));
    }
}

#[tokio::test]
async fn accept_escrow_without_deposit_funds_rolls_back() {
    let h = hive(200, 5).await;
    let task = h
        .service
        .create(&h.poster, request(100, AssignmentMode::OwnerAssigns, true))
        .await
        .unwrap()
        .task;
    h.service
        .assign(
            &h.poster,
            task.id,
            &AssignTask {
                handle: Some("worker".to_string()),
            },
        )
        .await
        .unwrap();

    let err = h.service.accept_escrow(&h.worker, task.id).await.unwrap_err();
    assert!(matches!(err, TaskError::InsufficientPoints { .. }));
    assert_eq!(
        err.to_string(),
        "Insufficient points. You need 10 points but have 5."
    );

    let unchanged = h.service.get(task.id).await.unwrap();
    assert_eq!(unchanged.status, TaskStatus::Claimed);
    assert_eq!(unchanged.assignee.as_deref(), Some("worker"));
    assert_eq!(unchanged.escrow_status, EscrowStatus::PosterHeld);
    assert_eq!(unchanged.assignee_escrow, 0);
    assert_eq!(balance_of(&h.db, &h.worker).await, 5);
    h.reconciles().await;
}

#[tokio::test]
async fn concurrent_settlements_have_one_winner() {
    let (_dir, db) = setup_file_db().await;
    let poster = seed_account(&db, "poster", 200).await;
    let worker = seed_account(&db, "worker", 10).await;
    let arbiter = seed_account(&db, "queenbee", 0).await;
    let service = TaskService::new(db.clone(), &Config::default());
    let task = service
        .create(&poster, request(100, AssignmentMode::Fcfs, true))
        .await
        .unwrap()
        .task;
    service.claim(&worker, task.id).await.unwrap();
    let worker_before = balance_of(&db, &worker).await;

    let split = even_split(100, 10);
    let results = futures::future::join_all(
        (0..2).map(|_| service.settle(&arbiter, task.id, &split)),
    )
    .await;
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    for result in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(matches!(result, TaskError::Conflict(_)));
    }

    let settled = service.get(task.id).await.unwrap();
    assert_eq!(settled.escrow_status, EscrowStatus::Settled);
    // one payout of 100, the returned deposit and the first-completion bonus
    assert_eq!(balance_of(&db, &worker).await - worker_before, 120);
    for account in [&poster, &worker, &arbiter] {
        assert_ledger_reconciles(&db, account.row_id).await;
    }
}
