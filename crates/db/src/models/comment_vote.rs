use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};

use crate::entities::comment_vote;

pub struct CommentVote;

impl CommentVote {
    /// Current direction for (comment, voter), 0 when there is no vote.
    pub async fn direction<C: ConnectionTrait>(
        db: &C,
        comment_row_id: i64,
        account_row_id: i64,
    ) -> Result<i32, DbErr> {
        let direction: Option<i32> = comment_vote::Entity::find()
            .select_only()
            .column(comment_vote::Column::Direction)
            .filter(comment_vote::Column::CommentId.eq(comment_row_id))
            .filter(comment_vote::Column::AccountId.eq(account_row_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(direction.unwrap_or(0))
    }

    /// Stores `direction`; 0 deletes the vote.
    pub async fn set<C: ConnectionTrait>(
        db: &C,
        comment_row_id: i64,
        account_row_id: i64,
        direction: i32,
    ) -> Result<(), DbErr> {
        let existing = comment_vote::Entity::find()
            .filter(comment_vote::Column::CommentId.eq(comment_row_id))
            .filter(comment_vote::Column::AccountId.eq(account_row_id))
            .one(db)
            .await?;

        match (existing, direction) {
            (Some(record), 0) => {
                comment_vote::Entity::delete_by_id(record.id).exec(db).await?;
            }
            (None, 0) => {}
            (Some(record), direction) => {
                let mut active: comment_vote::ActiveModel = record.into();
                active.direction = Set(direction);
                active.updated_at = Set(Utc::now().into());
                active.update(db).await?;
            }
            (None, direction) => {
                let now = Utc::now();
                let active = comment_vote::ActiveModel {
                    comment_id: Set(comment_row_id),
                    account_id: Set(account_row_id),
                    direction: Set(direction),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                    ..Default::default()
                };
                active.insert(db).await?;
            }
        }
        Ok(())
    }

    /// Live sum of all votes on the comment.
    pub async fn score<C: ConnectionTrait>(db: &C, comment_row_id: i64) -> Result<i64, DbErr> {
        let score: Option<i64> = comment_vote::Entity::find()
            .select_only()
            .column_as(
                Expr::cust("CAST(COALESCE(SUM(direction), 0) AS BIGINT)"),
                "score",
            )
            .filter(comment_vote::Column::CommentId.eq(comment_row_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(score.unwrap_or(0))
    }
}
