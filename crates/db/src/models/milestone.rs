use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::{entities::user_milestone, types::MilestoneKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub milestone: MilestoneKind,
    pub points_awarded: i64,
    pub awarded_at: DateTime<Utc>,
}

impl Milestone {
    pub async fn exists<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
        milestone: MilestoneKind,
    ) -> Result<bool, DbErr> {
        let count = user_milestone::Entity::find()
            .filter(user_milestone::Column::AccountId.eq(account_row_id))
            .filter(user_milestone::Column::Milestone.eq(milestone))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Inserts the (account, milestone) pair. Returns false if it was already there.
    pub async fn insert_once<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
        milestone: MilestoneKind,
        points_awarded: i64,
    ) -> Result<bool, DbErr> {
        let active = user_milestone::ActiveModel {
            account_id: Set(account_row_id),
            milestone: Set(milestone),
            points_awarded: Set(points_awarded),
            awarded_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let inserted = user_milestone::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    user_milestone::Column::AccountId,
                    user_milestone::Column::Milestone,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(inserted > 0)
    }

    pub async fn list_for_account<C: ConnectionTrait>(
        db: &C,
        account_row_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = user_milestone::Entity::find()
            .filter(user_milestone::Column::AccountId.eq(account_row_id))
            .order_by_asc(user_milestone::Column::Id)
            .all(db)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| Self {
                milestone: model.milestone,
                points_awarded: model.points_awarded,
                awarded_at: model.awarded_at.into(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use uuid::Uuid;

    use super::*;
    use crate::models::account::{Account, CreateAccount};

    #[tokio::test]
    async fn insert_once_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let account = Account::create(
            &db,
            &CreateAccount {
                handle: "bee".to_string(),
                name: "Bee".to_string(),
                description: None,
            },
            "hash-bee",
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert!(
            !Milestone::exists(&db, account.row_id, MilestoneKind::FirstTaskPosted)
                .await
                .unwrap()
        );
        assert!(
            Milestone::insert_once(&db, account.row_id, MilestoneKind::FirstTaskPosted, 5)
                .await
                .unwrap()
        );
        assert!(
            !Milestone::insert_once(&db, account.row_id, MilestoneKind::FirstTaskPosted, 5)
                .await
                .unwrap()
        );
        assert!(
            Milestone::exists(&db, account.row_id, MilestoneKind::FirstTaskPosted)
                .await
                .unwrap()
        );
        assert_eq!(
            Milestone::list_for_account(&db, account.row_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
