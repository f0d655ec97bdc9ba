use config::MilestoneBonuses;
use db::{
    models::{account::Account, milestone::Milestone, point_transaction::PointReason, task::Task},
    types::MilestoneKind,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::{error::LedgerError, ledger::Ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneAward {
    pub milestone: MilestoneKind,
    pub awarded: bool,
    pub points: i64,
}

/// Grants each milestone bonus at most once per account.
#[derive(Clone)]
pub struct MilestoneAwarder {
    bonuses: MilestoneBonuses,
}

impl MilestoneAwarder {
    pub fn new(bonuses: MilestoneBonuses) -> Self {
        Self { bonuses }
    }

    pub async fn award<C: ConnectionTrait>(
        &self,
        conn: &C,
        account_row_id: i64,
        milestone: MilestoneKind,
        task_row_id: Option<i64>,
    ) -> Result<MilestoneAward, LedgerError> {
        let not_awarded = MilestoneAward {
            milestone,
            awarded: false,
            points: 0,
        };
        if Milestone::exists(conn, account_row_id, milestone).await? {
            return Ok(not_awarded);
        }

        let points = self.bonuses.amount(milestone);
        if !Milestone::insert_once(conn, account_row_id, milestone, points).await? {
            return Ok(not_awarded);
        }
        if points > 0 {
            Ledger::credit(
                conn,
                account_row_id,
                task_row_id,
                points,
                PointReason::MilestoneBonus { milestone },
            )
            .await?;
        }
        tracing::info!(account = account_row_id, %milestone, points, "milestone awarded");
        Ok(MilestoneAward {
            milestone,
            awarded: true,
            points,
        })
    }

    /// Fires `first_task_posted` when the author's post count has just become 1.
    pub async fn on_task_posted<C: ConnectionTrait>(
        &self,
        conn: &C,
        author_row_id: i64,
        task_row_id: i64,
    ) -> Result<Option<MilestoneAward>, LedgerError> {
        if Task::count_by_author(conn, author_row_id).await? != 1 {
            return Ok(None);
        }
        let award = self
            .award(
                conn,
                author_row_id,
                MilestoneKind::FirstTaskPosted,
                Some(task_row_id),
            )
            .await?;
        Ok(award.awarded.then_some(award))
    }

    /// Increments the completion counter and awards whatever threshold it hit.
    pub async fn on_task_completed<C: ConnectionTrait>(
        &self,
        conn: &C,
        assignee_row_id: i64,
        task_row_id: i64,
    ) -> Result<Vec<MilestoneAward>, LedgerError> {
        let count = Account::increment_completed(conn, assignee_row_id).await?;
        let mut awards = Vec::new();
        if let Some(milestone) = MilestoneKind::for_completion_count(count) {
            let award = self
                .award(conn, assignee_row_id, milestone, Some(task_row_id))
                .await?;
            if award.awarded {
                awards.push(award);
            }
        }
        Ok(awards)
    }
}
