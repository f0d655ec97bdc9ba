use sea_orm_migration::prelude::*;

use crate::m20260101000000_baseline::{
    Accounts, Tasks, fk_id_col, fk_id_nullable_col, pk_id_col, timestamp_col, uuid_col,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(NotificationOutbox::Table)
                    .col(pk_id_col(manager, NotificationOutbox::Id))
                    .col(uuid_col(NotificationOutbox::Uuid))
                    .col(fk_id_col(manager, NotificationOutbox::RecipientId))
                    .col(
                        ColumnDef::new(NotificationOutbox::Kind)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(fk_id_nullable_col(manager, NotificationOutbox::TaskId))
                    .col(ColumnDef::new(NotificationOutbox::Payload).json().not_null())
                    .col(timestamp_col(NotificationOutbox::CreatedAt))
                    .col(ColumnDef::new(NotificationOutbox::DeliveredAt).timestamp())
                    .col(
                        ColumnDef::new(NotificationOutbox::Attempts)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(NotificationOutbox::LastError).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_outbox_recipient_id")
                            .from(NotificationOutbox::Table, NotificationOutbox::RecipientId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_outbox_task_id")
                            .from(NotificationOutbox::Table, NotificationOutbox::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notification_outbox_delivered_at")
                    .table(NotificationOutbox::Table)
                    .col(NotificationOutbox::DeliveredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationOutbox::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum NotificationOutbox {
    Table,
    Id,
    Uuid,
    RecipientId,
    Kind,
    TaskId,
    Payload,
    CreatedAt,
    DeliveredAt,
    Attempts,
    LastError,
}
