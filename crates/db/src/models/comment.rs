use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entities::comment, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    #[serde(skip)]
    pub row_id: i64,
    #[serde(skip)]
    pub author_row_id: i64,
    pub task_id: Uuid,
    pub author: String,
    pub content: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    async fn from_model<C: ConnectionTrait>(db: &C, model: comment::Model) -> Result<Self, DbErr> {
        let task_id = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let author = ids::account_handle_by_id(db, model.author_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Account not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            row_id: model.id,
            author_row_id: model.author_id,
            task_id,
            author,
            content: model.content,
            score: model.score,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        task_row_id: i64,
        author_row_id: i64,
        content: &str,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = comment::ActiveModel {
            uuid: Set(id),
            task_id: Set(task_row_id),
            author_id: Set(author_row_id),
            content: Set(content.to_string()),
            score: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = comment::Entity::find()
            .filter(comment::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Locks the comment row so concurrent votes on it serialize.
    pub async fn find_by_id_for_update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = comment::Entity::find()
            .filter(comment::Column::Uuid.eq(id))
            .lock_exclusive()
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_task<C: ConnectionTrait>(
        db: &C,
        task_row_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = comment::Entity::find()
            .filter(comment::Column::TaskId.eq(task_row_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(db)
            .await?;
        let mut comments = Vec::with_capacity(models.len());
        for model in models {
            comments.push(Self::from_model(db, model).await?);
        }
        Ok(comments)
    }

    pub async fn set_score<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        score: i64,
    ) -> Result<(), DbErr> {
        let result = comment::Entity::update_many()
            .col_expr(comment::Column::Score, Expr::value(score))
            .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(comment::Column::Id.eq(row_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound("Comment not found".to_string()));
        }
        Ok(())
    }
}
