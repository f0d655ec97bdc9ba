use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::account;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    #[serde(skip)]
    pub row_id: i64,
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub total_points: i64,
    pub vote_points_today: i64,
    pub vote_points_reset_date: Option<NaiveDate>,
    pub tasks_completed_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
}

impl Account {
    fn from_model(model: account::Model) -> Self {
        Self {
            id: model.uuid,
            row_id: model.id,
            handle: model.handle,
            name: model.name,
            description: model.description,
            total_points: model.total_points,
            vote_points_today: model.vote_points_today,
            vote_points_reset_date: model.vote_points_reset_date,
            tasks_completed_count: model.tasks_completed_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateAccount,
        api_key_hash: &str,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = account::ActiveModel {
            uuid: Set(id),
            handle: Set(data.handle.clone()),
            name: Set(data.name.clone()),
            description: Set(data.description.clone()),
            api_key_hash: Set(api_key_hash.to_string()),
            total_points: Set(0),
            vote_points_today: Set(0),
            vote_points_reset_date: Set(None),
            tasks_completed_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = account::Entity::find()
            .filter(account::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_row_id<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = account::Entity::find_by_id(row_id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Reads the account under a row lock (`FOR UPDATE` on backends that have one).
    pub async fn find_by_row_id_for_update<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = account::Entity::find_by_id(row_id)
            .lock_exclusive()
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_handle<C: ConnectionTrait>(
        db: &C,
        handle: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = account::Entity::find()
            .filter(account::Column::Handle.eq(handle))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_api_key_hash<C: ConnectionTrait>(
        db: &C,
        api_key_hash: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = account::Entity::find()
            .filter(account::Column::ApiKeyHash.eq(api_key_hash))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Highest balances first; earlier registrations win ties.
    pub async fn leaderboard<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Self>, DbErr> {
        let records = account::Entity::find()
            .order_by_desc(account::Column::TotalPoints)
            .order_by_asc(account::Column::CreatedAt)
            .order_by_asc(account::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Adds `delta` to the balance unless that would take it below zero.
    ///
    /// Returns the new balance, or `None` when the guard rejected the update.
    pub async fn apply_delta<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        delta: i64,
    ) -> Result<Option<i64>, DbErr> {
        let result = account::Entity::update_many()
            .col_expr(
                account::Column::TotalPoints,
                Expr::col(account::Column::TotalPoints).add(delta),
            )
            .col_expr(account::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(account::Column::Id.eq(row_id))
            .filter(account::Column::TotalPoints.gte(-delta))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        let balance: Option<i64> = account::Entity::find()
            .select_only()
            .column(account::Column::TotalPoints)
            .filter(account::Column::Id.eq(row_id))
            .into_tuple()
            .one(db)
            .await?;
        balance
            .ok_or(DbErr::RecordNotFound("Account not found".to_string()))
            .map(Some)
    }

    pub async fn set_vote_counter<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        day: NaiveDate,
        earned_today: i64,
    ) -> Result<(), DbErr> {
        let result = account::Entity::update_many()
            .col_expr(account::Column::VotePointsToday, Expr::value(earned_today))
            .col_expr(account::Column::VotePointsResetDate, Expr::value(day))
            .filter(account::Column::Id.eq(row_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound("Account not found".to_string()));
        }
        Ok(())
    }

    /// Bumps the completion counter and returns its new value.
    pub async fn increment_completed<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
    ) -> Result<i64, DbErr> {
        let result = account::Entity::update_many()
            .col_expr(
                account::Column::TasksCompletedCount,
                Expr::col(account::Column::TasksCompletedCount).add(1),
            )
            .filter(account::Column::Id.eq(row_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound("Account not found".to_string()));
        }

        let count: Option<i64> = account::Entity::find()
            .select_only()
            .column(account::Column::TasksCompletedCount)
            .filter(account::Column::Id.eq(row_id))
            .into_tuple()
            .one(db)
            .await?;
        count.ok_or(DbErr::RecordNotFound("Account not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create(db: &sea_orm::DatabaseConnection, handle: &str) -> Account {
        Account::create(
            db,
            &CreateAccount {
                handle: handle.to_string(),
                name: handle.to_uppercase(),
                description: Some("worker bee".to_string()),
            },
            &format!("hash-{handle}"),
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn apply_delta_never_goes_negative() {
        let db = setup_db().await;
        let account = create(&db, "bob").await;

        assert_eq!(
            Account::apply_delta(&db, account.row_id, 30).await.unwrap(),
            Some(30)
        );
        assert_eq!(
            Account::apply_delta(&db, account.row_id, -31).await.unwrap(),
            None
        );
        assert_eq!(
            Account::apply_delta(&db, account.row_id, -30).await.unwrap(),
            Some(0)
        );

        let reloaded = Account::find_by_row_id(&db, account.row_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.total_points, 0);
    }

    #[tokio::test]
    async fn lookups_by_handle_and_key_hash() {
        let db = setup_db().await;
        let account = create(&db, "carol").await;

        let by_handle = Account::find_by_handle(&db, "carol").await.unwrap().unwrap();
        assert_eq!(by_handle.id, account.id);
        let by_hash = Account::find_by_api_key_hash(&db, "hash-carol")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_hash.row_id, account.row_id);
        assert!(Account::find_by_handle(&db, "dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_balance_then_age() {
        let db = setup_db().await;
        let early = create(&db, "early").await;
        let late = create(&db, "late").await;
        let top = create(&db, "top").await;
        create(&db, "broke").await;
        Account::apply_delta(&db, early.row_id, 40).await.unwrap();
        Account::apply_delta(&db, late.row_id, 40).await.unwrap();
        Account::apply_delta(&db, top.row_id, 90).await.unwrap();

        let board = Account::leaderboard(&db, 3).await.unwrap();
        let handles: Vec<_> = board.iter().map(|a| a.handle.as_str()).collect();
        assert_eq!(handles, ["top", "early", "late"]);
        assert_eq!(board[0].total_points, 90);
    }

    #[tokio::test]
    async fn duplicate_handles_are_rejected() {
        let db = setup_db().await;
        create(&db, "erin").await;
        let duplicate = Account::create(
            &db,
            &CreateAccount {
                handle: "erin".to_string(),
                name: "Other".to_string(),
                description: None,
            },
            "another-hash",
            Uuid::new_v4(),
        )
        .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn completion_counter_and_vote_counter() {
        let db = setup_db().await;
        let account = create(&db, "frank").await;

        assert_eq!(
            Account::increment_completed(&db, account.row_id).await.unwrap(),
            1
        );
        assert_eq!(
            Account::increment_completed(&db, account.row_id).await.unwrap(),
            2
        );

        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        Account::set_vote_counter(&db, account.row_id, day, 12)
            .await
            .unwrap();
        let reloaded = Account::find_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(reloaded.vote_points_today, 12);
        assert_eq!(reloaded.vote_points_reset_date, Some(day));
        assert_eq!(reloaded.tasks_completed_count, 2);
    }
}
