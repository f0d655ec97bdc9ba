use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::point_transaction,
    models::ids,
    types::{MilestoneKind, TransactionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowSide {
    Poster,
    Assignee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutRole {
    Payer,
    Payee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundCause {
    Cancellation,
    Settlement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitCause {
    Abandonment,
    SettlementPenalty,
}

/// Why a ledger row exists. Serialized into the row's `meta` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointReason {
    EscrowHold {
        side: EscrowSide,
    },
    EscrowRelease {
        side: EscrowSide,
    },
    EscrowForfeit {
        cause: ForfeitCause,
    },
    BountyPayout {
        role: PayoutRole,
    },
    Refund {
        cause: RefundCause,
    },
    VoteReceived {
        comment_id: Uuid,
        direction: i32,
        prev_direction: i32,
    },
    MilestoneBonus {
        milestone: MilestoneKind,
    },
    EarlyCompletionBonus {
        bounty: i64,
        percent: i64,
    },
    Grant {
        granted_by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl PointReason {
    pub fn kind(&self) -> TransactionKind {
        match self {
            PointReason::EscrowHold { .. } => TransactionKind::EscrowHold,
            PointReason::EscrowRelease { .. } => TransactionKind::EscrowRelease,
            PointReason::EscrowForfeit { .. } => TransactionKind::EscrowForfeit,
            PointReason::BountyPayout { .. } => TransactionKind::BountyPayout,
            PointReason::Refund { .. } => TransactionKind::Refund,
            PointReason::VoteReceived { .. } => TransactionKind::VoteReceived,
            PointReason::MilestoneBonus { .. } => TransactionKind::MilestoneBonus,
            PointReason::EarlyCompletionBonus { .. } => TransactionKind::EarlyCompletionBonus,
            PointReason::Grant { .. } => TransactionKind::Grant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub amount: i64,
    pub reason: TransactionKind,
    pub balance_after: i64,
    pub meta: Option<PointReason>,
    pub created_at: DateTime<Utc>,
}

impl PointTransaction {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: point_transaction::Model,
    ) -> Result<Self, DbErr> {
        let task_id = match model.task_id {
            Some(id) => ids::task_uuid_by_id(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("Task not found".to_string()))
                .map(Some)?,
            None => None,
        };
        Ok(Self {
            id: model.uuid,
            task_id,
            amount: model.amount,
            reason: model.kind,
            balance_after: model.balance_after,
            meta: serde_json::from_value(model.meta).ok(),
            created_at: model.created_at.into(),
        })
    }

    /// Appends a row. Only called right after the matching balance update.
    pub async fn record<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
        task_row_id: Option<i64>,
        amount: i64,
        balance_after: i64,
        reason: &PointReason,
    ) -> Result<Self, DbErr> {
        let meta = serde_json::to_value(reason).map_err(|err| DbErr::Custom(err.to_string()))?;
        let active = point_transaction::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            account_id: Set(account_row_id),
            task_id: Set(task_row_id),
            amount: Set(amount),
            kind: Set(reason.kind()),
            balance_after: Set(balance_after),
            meta: Set(meta),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    /// Newest first.
    pub async fn list_for_account<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = point_transaction::Entity::find()
            .filter(point_transaction::Column::AccountId.eq(account_row_id))
            .order_by_desc(point_transaction::Column::CreatedAt)
            .order_by_desc(point_transaction::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        let mut rows = Vec::with_capacity(models.len());
        for model in models {
            rows.push(Self::from_model(db, model).await?);
        }
        Ok(rows)
    }

    pub async fn list_for_task<C: ConnectionTrait>(
        db: &C,
        task_row_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = point_transaction::Entity::find()
            .filter(point_transaction::Column::TaskId.eq(task_row_id))
            .order_by_asc(point_transaction::Column::Id)
            .all(db)
            .await?;
        let mut rows = Vec::with_capacity(models.len());
        for model in models {
            rows.push(Self::from_model(db, model).await?);
        }
        Ok(rows)
    }

    pub async fn sum_for_account<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
    ) -> Result<i64, DbErr> {
        let total: Option<i64> = point_transaction::Entity::find()
            .select_only()
            .column_as(
                Expr::cust("CAST(COALESCE(SUM(amount), 0) AS BIGINT)"),
                "total",
            )
            .filter(point_transaction::Column::AccountId.eq(account_row_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::account::{Account, CreateAccount};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[test]
    fn reasons_serialize_with_type_tag() {
        let reason = PointReason::EscrowHold {
            side: EscrowSide::Assignee,
        };
        assert_eq!(
            serde_json::to_value(&reason).unwrap(),
            serde_json::json!({ "type": "escrow_hold", "side": "assignee" })
        );
        assert_eq!(reason.kind(), TransactionKind::EscrowHold);

        let milestone = PointReason::MilestoneBonus {
            milestone: MilestoneKind::FiveCompletions,
        };
        assert_eq!(
            serde_json::to_value(&milestone).unwrap()["milestone"],
            serde_json::json!("five_completions")
        );
    }

    #[tokio::test]
    async fn records_list_newest_first_and_sum() {
        let db = setup_db().await;
        let account = Account::create(
            &db,
            &CreateAccount {
                handle: "ledger".to_string(),
                name: "Ledger".to_string(),
                description: None,
            },
            "hash-ledger",
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let grant = PointReason::Grant {
            granted_by: "queenbee".to_string(),
            note: None,
        };
        PointTransaction::record(&db, account.row_id, None, 40, 40, &grant)
            .await
            .unwrap();
        let hold = PointReason::EscrowHold {
            side: EscrowSide::Poster,
        };
        PointTransaction::record(&db, account.row_id, None, -15, 25, &hold)
            .await
            .unwrap();

        let rows = PointTransaction::list_for_account(&db, account.row_id, 50)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, -15);
        assert_eq!(rows[0].reason, TransactionKind::EscrowHold);
        assert_eq!(rows[0].meta, Some(hold));
        assert_eq!(rows[1].balance_after, 40);

        assert_eq!(
            PointTransaction::sum_for_account(&db, account.row_id)
                .await
                .unwrap(),
            25
        );
        assert_eq!(
            PointTransaction::list_for_account(&db, account.row_id, 1)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
