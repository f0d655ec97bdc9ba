use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

use crate::types::TransactionKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "point_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub account_id: i64,
    pub task_id: Option<i64>,
    pub amount: i64,
    pub kind: TransactionKind,
    pub balance_after: i64,
    pub meta: JsonValue,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
