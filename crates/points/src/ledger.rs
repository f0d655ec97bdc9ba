use db::{
    DBService, TransactionTrait,
    models::{
        account::Account,
        point_transaction::{PointReason, PointTransaction},
    },
    retry::retry_on_busy,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const MAX_HISTORY_LIMIT: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub total_points: i64,
    pub ledger_sum: i64,
    pub consistent: bool,
}

/// Every balance change goes through here so each one gets exactly one ledger row.
#[derive(Clone)]
pub struct Ledger {
    db: DBService,
}

impl Ledger {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    /// Applies `amount` to the account and appends the matching row.
    ///
    /// Must run inside the caller's transaction. Debits that would overdraw fail
    /// with `InsufficientPoints` and leave the balance untouched.
    pub async fn post<C: ConnectionTrait>(
        conn: &C,
        account_row_id: i64,
        task_row_id: Option<i64>,
        amount: i64,
        reason: PointReason,
    ) -> Result<PointTransaction, LedgerError> {
        let Some(balance_after) = Account::apply_delta(conn, account_row_id, amount).await? else {
            let account = Account::find_by_row_id(conn, account_row_id)
                .await?
                .ok_or(LedgerError::AccountNotFound)?;
            return Err(LedgerError::InsufficientPoints {
                needed: -amount,
                available: account.total_points,
            });
        };

        let row = PointTransaction::record(
            conn,
            account_row_id,
            task_row_id,
            amount,
            balance_after,
            &reason,
        )
        .await?;
        tracing::info!(
            account = account_row_id,
            task_id = ?task_row_id,
            amount,
            reason = %row.reason,
            balance_after,
            "ledger entry"
        );
        Ok(row)
    }

    pub async fn credit<C: ConnectionTrait>(
        conn: &C,
        account_row_id: i64,
        task_row_id: Option<i64>,
        amount: i64,
        reason: PointReason,
    ) -> Result<PointTransaction, LedgerError> {
        Self::post(conn, account_row_id, task_row_id, amount.abs(), reason).await
    }

    pub async fn debit<C: ConnectionTrait>(
        conn: &C,
        account_row_id: i64,
        task_row_id: Option<i64>,
        amount: i64,
        reason: PointReason,
    ) -> Result<PointTransaction, LedgerError> {
        Self::post(conn, account_row_id, task_row_id, -amount.abs(), reason).await
    }

    /// Credits points that enter the economy from outside any task.
    pub async fn grant(
        &self,
        account_row_id: i64,
        amount: i64,
        granted_by: &str,
        note: Option<String>,
    ) -> Result<PointTransaction, LedgerError> {
        retry_on_busy(|| {
            let note = note.clone();
            async move {
                let txn = self.db.pool.begin().await?;
                let row = Self::credit(
                    &txn,
                    account_row_id,
                    None,
                    amount,
                    PointReason::Grant {
                        granted_by: granted_by.to_string(),
                        note,
                    },
                )
                .await?;
                txn.commit().await?;
                Ok::<_, LedgerError>(row)
            }
        })
        .await
    }

    /// Newest first; `limit` is clamped to 1..=100.
    pub async fn history(
        &self,
        account_row_id: i64,
        limit: Option<u64>,
    ) -> Result<Vec<PointTransaction>, LedgerError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(PointTransaction::list_for_account(&self.db.pool, account_row_id, limit).await?)
    }

    pub async fn reconcile(&self, account_row_id: i64) -> Result<Reconciliation, LedgerError> {
        Self::reconcile_on(&self.db.pool, account_row_id).await
    }

    pub async fn reconcile_on<C: ConnectionTrait>(
        conn: &C,
        account_row_id: i64,
    ) -> Result<Reconciliation, LedgerError> {
        let account = Account::find_by_row_id(conn, account_row_id)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        let ledger_sum = PointTransaction::sum_for_account(conn, account_row_id).await?;
        Ok(Reconciliation {
            total_points: account.total_points,
            ledger_sum,
            consistent: account.total_points == ledger_sum,
        })
    }
}
