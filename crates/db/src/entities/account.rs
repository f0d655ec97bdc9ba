use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    #[sea_orm(unique)]
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub api_key_hash: String,
    pub total_points: i64,
    pub vote_points_today: i64,
    pub vote_points_reset_date: Option<Date>,
    pub tasks_completed_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
