use chrono::{NaiveDate, Utc};
use config::EconomyConfig;
use db::{
    DBService, TransactionTrait,
    models::{
        account::Account, comment::Comment, comment_vote::CommentVote,
        point_transaction::PointReason,
    },
    retry::retry_on_busy,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::VoteError, ledger::Ledger};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub comment_id: Uuid,
    pub score: i64,
    pub user_vote: i32,
    pub author_points_change: i64,
}

/// Points the comment author holds for a single vote in `direction`.
pub fn vote_points(direction: i32, economy: &EconomyConfig) -> i64 {
    match direction {
        1 => economy.upvote_points,
        -1 => economy.downvote_points,
        _ => 0,
    }
}

/// Applies the daily cap to a positive delta.
///
/// Returns `(effective_delta, earned_today_after)`. Negative deltas pass through.
pub fn apply_daily_cap(delta: i64, earned_today: i64, cap: i64) -> (i64, i64) {
    if delta <= 0 {
        return (delta, earned_today);
    }
    let room = (cap - earned_today).max(0);
    let effective = delta.min(room);
    (effective, earned_today + effective)
}

#[derive(Clone)]
pub struct VoteRewards {
    db: DBService,
    economy: EconomyConfig,
}

impl VoteRewards {
    pub fn new(db: DBService, economy: EconomyConfig) -> Self {
        Self { db, economy }
    }

    pub async fn vote(
        &self,
        voter: &Account,
        comment_id: Uuid,
        direction: i32,
    ) -> Result<VoteOutcome, VoteError> {
        self.vote_on(voter, comment_id, direction, Utc::now().date_naive())
            .await
    }

    /// Same as [`vote`](Self::vote) with an explicit UTC calendar day for the cap.
    pub async fn vote_on(
        &self,
        voter: &Account,
        comment_id: Uuid,
        direction: i32,
        today: NaiveDate,
    ) -> Result<VoteOutcome, VoteError> {
        if !matches!(direction, -1..=1) {
            return Err(VoteError::InvalidDirection);
        }
        retry_on_busy(|| self.vote_once(voter.row_id, comment_id, direction, today)).await
    }

    async fn vote_once(
        &self,
        voter_row_id: i64,
        comment_id: Uuid,
        direction: i32,
        today: NaiveDate,
    ) -> Result<VoteOutcome, VoteError> {
        let txn = self.db.pool.begin().await?;
        let comment = Comment::find_by_id_for_update(&txn, comment_id)
            .await?
            .ok_or(VoteError::CommentNotFound)?;
        if comment.author_row_id == voter_row_id {
            return Err(VoteError::SelfVote);
        }

        let previous = CommentVote::direction(&txn, comment.row_id, voter_row_id).await?;
        CommentVote::set(&txn, comment.row_id, voter_row_id, direction).await?;
        let score = CommentVote::score(&txn, comment.row_id).await?;
        Comment::set_score(&txn, comment.row_id, score).await?;

        let delta = vote_points(direction, &self.economy) - vote_points(previous, &self.economy);
        let mut applied = 0;
        if delta != 0 {
            let author = Account::find_by_row_id_for_update(&txn, comment.author_row_id)
                .await?
                .ok_or(VoteError::CommentNotFound)?;
            let earned_today = if author.vote_points_reset_date == Some(today) {
                author.vote_points_today
            } else {
                0
            };

            let (capped, earned_after) =
                apply_daily_cap(delta, earned_today, self.economy.daily_vote_cap);
            applied = if capped < 0 {
                capped.max(-author.total_points)
            } else {
                capped
            };
            Account::set_vote_counter(&txn, author.row_id, today, earned_after).await?;

            if applied != 0 {
                Ledger::post(
                    &txn,
                    author.row_id,
                    None,
                    applied,
                    PointReason::VoteReceived {
                        comment_id,
                        direction,
                        prev_direction: previous,
                    },
                )
                .await?;
            }
        }

        txn.commit().await?;
        tracing::debug!(
            comment_id = %comment_id,
            direction,
            previous,
            score,
            author_points_change = applied,
            "comment vote recorded"
        );
        Ok(VoteOutcome {
            comment_id,
            score,
            user_vote: direction,
            author_points_change: applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use db::models::task::{NewTask, Task};
    use test_support::{assert_ledger_reconciles, seed_account, setup_db};

    use super::*;

    #[test]
    fn cap_limits_positive_deltas_only() {
        assert_eq!(apply_daily_cap(2, 0, 50), (2, 2));
        assert_eq!(apply_daily_cap(2, 49, 50), (1, 50));
        assert_eq!(apply_daily_cap(2, 50, 50), (0, 50));
        assert_eq!(apply_daily_cap(3, 60, 50), (0, 60));
        assert_eq!(apply_daily_cap(-1, 50, 50), (-1, 50));
        assert_eq!(apply_daily_cap(-3, 0, 50), (-3, 0));
    }

    #[test]
    fn vote_point_table() {
        let economy = EconomyConfig::default();
        assert_eq!(vote_points(1, &economy), 2);
        assert_eq!(vote_points(-1, &economy), -1);
        assert_eq!(vote_points(0, &economy), 0);
        // Flip from up to down costs the author both halves.
        assert_eq!(vote_points(-1, &economy) - vote_points(1, &economy), -3);
    }

    struct Fixture {
        db: DBService,
        author: Account,
        voters: Vec<Account>,
        comment: Comment,
    }

    async fn fixture(author_points: i64) -> Fixture {
        let db = setup_db().await;
        let author = seed_account(&db, "author", author_points).await;
        let mut voters = Vec::new();
        for handle in ["v1", "v2", "v3"] {
            voters.push(seed_account(&db, handle, 0).await);
        }
        let task = Task::create(&db.pool, &NewTask::simple("t", 5), author.row_id, Uuid::new_v4())
            .await
            .unwrap();
        let comment = Comment::create(&db.pool, task.row_id, author.row_id, "answer", Uuid::new_v4())
            .await
            .unwrap();
        Fixture {
            db,
            author,
            voters,
            comment,
        }
    }

    async fn balance(db: &DBService, account: &Account) -> i64 {
        Account::find_by_row_id(&db.pool, account.row_id)
            .await
            .unwrap()
            .unwrap()
            .total_points
    }

    #[tokio::test]
    async fn self_vote_is_rejected() {
        let f = fixture(0).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());
        let err = rewards.vote(&f.author, f.comment.id, 1).await.unwrap_err();
        assert!(matches!(err, VoteError::SelfVote));
    }

    #[tokio::test]
    async fn invalid_direction_and_missing_comment() {
        let f = fixture(0).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());
        assert!(matches!(
            rewards.vote(&f.voters[0], f.comment.id, 2).await,
            Err(VoteError::InvalidDirection)
        ));
        assert!(matches!(
            rewards.vote(&f.voters[0], Uuid::new_v4(), 1).await,
            Err(VoteError::CommentNotFound)
        ));
    }

    #[tokio::test]
    async fn upvote_change_and_removal_track_score_and_points() {
        let f = fixture(0).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());
        let voter = &f.voters[0];

        let up = rewards.vote(voter, f.comment.id, 1).await.unwrap();
        assert_eq!(up.score, 1);
        assert_eq!(up.author_points_change, 2);

        let repeat = rewards.vote(voter, f.comment.id, 1).await.unwrap();
        assert_eq!(repeat.author_points_change, 0);

        let down = rewards.vote(voter, f.comment.id, -1).await.unwrap();
        assert_eq!(down.score, -1);
        assert_eq!(down.author_points_change, -2);
        assert_eq!(balance(&f.db, &f.author).await, 0);

        let cleared = rewards.vote(voter, f.comment.id, 0).await.unwrap();
        assert_eq!(cleared.score, 0);
        assert_eq!(cleared.user_vote, 0);
        assert_eq!(cleared.author_points_change, 1);
        assert_eq!(balance(&f.db, &f.author).await, 1);

        let stored = Comment::find_by_id(&f.db.pool, f.comment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, 0);
        assert_ledger_reconciles(&f.db, f.author.row_id).await;
    }

    #[tokio::test]
    async fn daily_cap_stops_upvotes_but_not_downvotes() {
        let f = fixture(100).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());
        let today = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        Account::set_vote_counter(&f.db.pool, f.author.row_id, today, 50)
            .await
            .unwrap();

        let capped = rewards
            .vote_on(&f.voters[0], f.comment.id, 1, today)
            .await
            .unwrap();
        assert_eq!(capped.author_points_change, 0);
        assert_eq!(capped.score, 1);

        let penalty = rewards
            .vote_on(&f.voters[1], f.comment.id, -1, today)
            .await
            .unwrap();
        assert_eq!(penalty.author_points_change, -1);
        assert_eq!(balance(&f.db, &f.author).await, 99);

        let tomorrow = today + Duration::days(1);
        let fresh = rewards
            .vote_on(&f.voters[2], f.comment.id, 1, tomorrow)
            .await
            .unwrap();
        assert_eq!(fresh.author_points_change, 2);

        let author = Account::find_by_row_id(&f.db.pool, f.author.row_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(author.vote_points_today, 2);
        assert_eq!(author.vote_points_reset_date, Some(tomorrow));
        assert_ledger_reconciles(&f.db, f.author.row_id).await;
    }

    #[tokio::test]
    async fn partial_cap_credits_only_the_remaining_room() {
        let f = fixture(0).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());
        let today = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        Account::set_vote_counter(&f.db.pool, f.author.row_id, today, 49)
            .await
            .unwrap();

        let outcome = rewards
            .vote_on(&f.voters[0], f.comment.id, 1, today)
            .await
            .unwrap();
        assert_eq!(outcome.author_points_change, 1);
        assert_eq!(balance(&f.db, &f.author).await, 1);
    }

    #[tokio::test]
    async fn downvote_on_empty_balance_writes_no_row() {
        let f = fixture(0).await;
        let rewards = VoteRewards::new(f.db.clone(), EconomyConfig::default());

        let outcome = rewards.vote(&f.voters[0], f.comment.id, -1).await.unwrap();
        assert_eq!(outcome.author_points_change, 0);
        assert_eq!(outcome.score, -1);

        let rows = Ledger::new(f.db.clone())
            .history(f.author.row_id, None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
