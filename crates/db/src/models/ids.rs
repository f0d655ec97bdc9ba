use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{account, comment, task};

pub async fn account_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    account::Entity::find()
        .select_only()
        .column(account::Column::Id)
        .filter(account::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn account_id_by_handle<C: ConnectionTrait>(
    db: &C,
    handle: &str,
) -> Result<Option<i64>, DbErr> {
    account::Entity::find()
        .select_only()
        .column(account::Column::Id)
        .filter(account::Column::Handle.eq(handle))
        .into_tuple()
        .one(db)
        .await
}

pub async fn account_handle_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<String>, DbErr> {
    account::Entity::find()
        .select_only()
        .column(account::Column::Handle)
        .filter(account::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task::Entity::find()
        .select_only()
        .column(task::Column::Id)
        .filter(task::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    task::Entity::find()
        .select_only()
        .column(task::Column::Uuid)
        .filter(task::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn comment_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    comment::Entity::find()
        .select_only()
        .column(comment::Column::Uuid)
        .filter(comment::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

/// Resolves an optional row id to its handle, failing if the row vanished.
pub(crate) async fn required_handle<C: ConnectionTrait>(
    db: &C,
    id: Option<i64>,
) -> Result<Option<String>, DbErr> {
    match id {
        Some(id) => account_handle_by_id(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Account not found".to_string()))
            .map(Some),
        None => Ok(None),
    }
}
