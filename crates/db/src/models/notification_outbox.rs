use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{entities::notification_outbox, events::NotificationPayload};

pub struct NotificationOutbox;

impl NotificationOutbox {
    pub async fn enqueue<C: ConnectionTrait>(
        db: &C,
        recipient_row_id: i64,
        task_row_id: Option<i64>,
        payload: &NotificationPayload,
    ) -> Result<(), DbErr> {
        let body =
            serde_json::to_value(payload).map_err(|err| DbErr::Custom(err.to_string()))?;
        let active = notification_outbox::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            recipient_id: Set(recipient_row_id),
            kind: Set(payload.kind),
            task_id: Set(task_row_id),
            payload: Set(body),
            created_at: Set(Utc::now().into()),
            delivered_at: Set(None),
            attempts: Set(0),
            last_error: Set(None),
            ..Default::default()
        };
        active.insert(db).await?;
        Ok(())
    }

    /// Undelivered rows that still have attempts left, oldest first.
    pub async fn fetch_pending<C: ConnectionTrait>(
        db: &C,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<notification_outbox::Model>, DbErr> {
        notification_outbox::Entity::find()
            .filter(notification_outbox::Column::DeliveredAt.is_null())
            .filter(notification_outbox::Column::Attempts.lt(max_attempts))
            .order_by_asc(notification_outbox::Column::CreatedAt)
            .order_by_asc(notification_outbox::Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn mark_delivered<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), DbErr> {
        let record = notification_outbox::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound(
                "Notification outbox record not found".to_string(),
            ))?;

        let mut active: notification_outbox::ActiveModel = record.into();
        active.delivered_at = Set(Some(Utc::now().into()));
        active.update(db).await?;
        Ok(())
    }

    pub async fn mark_failed<C: ConnectionTrait>(
        db: &C,
        id: i64,
        error: &str,
    ) -> Result<(), DbErr> {
        let record = notification_outbox::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound(
                "Notification outbox record not found".to_string(),
            ))?;

        let attempts = record.attempts + 1;
        let mut active: notification_outbox::ActiveModel = record.into();
        active.attempts = Set(attempts);
        active.last_error = Set(Some(error.to_string()));
        active.update(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::{
        models::account::{Account, CreateAccount},
        types::NotificationKind,
    };

    #[tokio::test]
    async fn outbox_enqueue_fetch_and_marking() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let account = Account::create(
            &db,
            &CreateAccount {
                handle: "poster".to_string(),
                name: "Poster".to_string(),
                description: None,
            },
            "hash-poster",
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        for kind in [NotificationKind::TaskClaimed, NotificationKind::TaskSettled] {
            NotificationOutbox::enqueue(
                &db,
                account.row_id,
                None,
                &NotificationPayload {
                    kind,
                    recipient: "poster".to_string(),
                    actor: "worker".to_string(),
                    task_id: None,
                    task_title: None,
                    detail: None,
                },
            )
            .await
            .unwrap();
        }

        let entries = NotificationOutbox::fetch_pending(&db, 10, 3).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, NotificationKind::TaskClaimed);

        NotificationOutbox::mark_delivered(&db, entries[0].id)
            .await
            .unwrap();
        let remaining = NotificationOutbox::fetch_pending(&db, 10, 3).await.unwrap();
        assert_eq!(remaining.len(), 1);

        let failing = remaining[0].id;
        for _ in 0..3 {
            NotificationOutbox::mark_failed(&db, failing, "boom")
                .await
                .unwrap();
        }
        assert!(
            NotificationOutbox::fetch_pending(&db, 10, 3)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
