use db::{
    models::{
        point_transaction::{EscrowSide, ForfeitCause, PayoutRole, PointReason, RefundCause},
        task::Task,
    },
    types::EscrowStatus,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::{bonus::percent_of, error::EscrowError, ledger::Ledger};

/// Arbiter-chosen split of both escrow pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settlement {
    pub assignee_payout: i64,
    pub poster_refund: i64,
    pub assignee_escrow_return: i64,
    pub assignee_escrow_penalty: i64,
}

impl Settlement {
    /// Both pools must be distributed exactly, with no negative part.
    pub fn validate(&self, poster_escrow: i64, assignee_escrow: i64) -> Result<(), EscrowError> {
        if [
            self.assignee_payout,
            self.poster_refund,
            self.assignee_escrow_return,
            self.assignee_escrow_penalty,
        ]
        .iter()
        .any(|amount| *amount < 0)
        {
            return Err(EscrowError::Conservation(
                "All settlement amounts must be non-negative integers.".to_string(),
            ));
        }
        if self.assignee_payout.checked_add(self.poster_refund) != Some(poster_escrow) {
            return Err(EscrowError::Conservation(format!(
                "assignee_payout ({}) + poster_refund ({}) must equal poster_escrow ({}).",
                self.assignee_payout, self.poster_refund, poster_escrow
            )));
        }
        if self
            .assignee_escrow_return
            .checked_add(self.assignee_escrow_penalty)
            != Some(assignee_escrow)
        {
            return Err(EscrowError::Conservation(format!(
                "assignee_escrow_return ({}) + assignee_escrow_penalty ({}) must equal assignee_escrow ({}).",
                self.assignee_escrow_return, self.assignee_escrow_penalty, assignee_escrow
            )));
        }
        Ok(())
    }

    pub fn assignee_received(&self) -> i64 {
        self.assignee_payout.saturating_add(self.assignee_escrow_return)
    }

    pub fn poster_received(&self) -> i64 {
        self.poster_refund.saturating_add(self.assignee_escrow_penalty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub assignee_handle: String,
    pub assignee_received: i64,
    pub poster_handle: String,
    pub poster_received: i64,
}

/// Custody of the two escrow pools. Every move in or out is one ledger row.
#[derive(Clone)]
pub struct EscrowManager {
    assignee_escrow_percent: i64,
}

impl EscrowManager {
    pub fn new(assignee_escrow_percent: i64) -> Self {
        Self {
            assignee_escrow_percent,
        }
    }

    pub fn assignee_deposit(&self, bounty: i64) -> i64 {
        percent_of(bounty, self.assignee_escrow_percent)
    }

    /// Takes the poster's deposit for a freshly inserted escrow task.
    pub async fn hold_poster<C: ConnectionTrait>(
        &self,
        conn: &C,
        task: &Task,
    ) -> Result<(), EscrowError> {
        Ledger::debit(
            conn,
            task.author_row_id,
            Some(task.row_id),
            task.poster_escrow,
            PointReason::EscrowHold {
                side: EscrowSide::Poster,
            },
        )
        .await?;
        Ok(())
    }

    /// Takes the assignee's deposit and moves escrow to `both_held`.
    pub async fn hold_assignee<C: ConnectionTrait>(
        &self,
        conn: &C,
        task: &Task,
        assignee_row_id: i64,
    ) -> Result<i64, EscrowError> {
        if task.escrow_status != EscrowStatus::PosterHeld {
            return Err(EscrowError::StateChanged {
                expected: EscrowStatus::PosterHeld,
                found: task.escrow_status,
            });
        }
        let deposit = self.assignee_deposit(task.points);
        if deposit > 0 {
            Ledger::debit(
                conn,
                assignee_row_id,
                Some(task.row_id),
                deposit,
                PointReason::EscrowHold {
                    side: EscrowSide::Assignee,
                },
            )
            .await?;
        }
        let moved = Task::escrow_guarded(
            conn,
            task.row_id,
            EscrowStatus::PosterHeld,
            EscrowStatus::BothHeld,
            Some(deposit),
        )
        .await?;
        if !moved {
            return Err(EscrowError::StateChanged {
                expected: EscrowStatus::PosterHeld,
                found: task.escrow_status,
            });
        }
        Ok(deposit)
    }

    /// Returns custody on cancellation. The poster keeps the assignee's deposit
    /// when escrow was `both_held`.
    pub async fn release_on_cancel<C: ConnectionTrait>(
        &self,
        conn: &C,
        task: &Task,
    ) -> Result<(), EscrowError> {
        if !task.escrow_status.is_held() {
            return Err(EscrowError::StateChanged {
                expected: EscrowStatus::PosterHeld,
                found: task.escrow_status,
            });
        }
        if task.poster_escrow > 0 {
            Ledger::credit(
                conn,
                task.author_row_id,
                Some(task.row_id),
                task.poster_escrow,
                PointReason::Refund {
                    cause: RefundCause::Cancellation,
                },
            )
            .await?;
        }
        if task.escrow_status == EscrowStatus::BothHeld && task.assignee_escrow > 0 {
            Ledger::credit(
                conn,
                task.author_row_id,
                Some(task.row_id),
                task.assignee_escrow,
                PointReason::EscrowForfeit {
                    cause: ForfeitCause::Abandonment,
                },
            )
            .await?;
        }
        Ok(())
    }

    /// Distributes both pools. `settlement` is validated before anything moves.
    pub async fn settle<C: ConnectionTrait>(
        &self,
        conn: &C,
        task: &Task,
        assignee_row_id: i64,
        settlement: &Settlement,
    ) -> Result<(), EscrowError> {
        if !task.escrow_status.is_held() {
            return Err(EscrowError::StateChanged {
                expected: EscrowStatus::BothHeld,
                found: task.escrow_status,
            });
        }
        settlement.validate(task.poster_escrow, task.assignee_escrow)?;

        let moves = [
            (
                assignee_row_id,
                settlement.assignee_payout,
                PointReason::BountyPayout {
                    role: PayoutRole::Payee,
                },
            ),
            (
                assignee_row_id,
                settlement.assignee_escrow_return,
                PointReason::EscrowRelease {
                    side: EscrowSide::Assignee,
                },
            ),
            (
                task.author_row_id,
                settlement.poster_refund,
                PointReason::Refund {
                    cause: RefundCause::Settlement,
                },
            ),
            (
                task.author_row_id,
                settlement.assignee_escrow_penalty,
                PointReason::EscrowForfeit {
                    cause: ForfeitCause::SettlementPenalty,
                },
            ),
        ];
        for (account_row_id, amount, reason) in moves {
            if amount > 0 {
                Ledger::credit(conn, account_row_id, Some(task.row_id), amount, reason).await?;
            }
        }
        Ok(())
    }
}
