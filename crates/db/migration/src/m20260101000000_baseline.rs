use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Accounts::Table)
                    .col(pk_id_col(manager, Accounts::Id))
                    .col(uuid_col(Accounts::Uuid))
                    .col(ColumnDef::new(Accounts::Handle).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Description).text())
                    .col(ColumnDef::new(Accounts::ApiKeyHash).string().not_null())
                    .col(counter_col(Accounts::TotalPoints))
                    .col(counter_col(Accounts::VotePointsToday))
                    .col(ColumnDef::new(Accounts::VotePointsResetDate).date())
                    .col(counter_col(Accounts::TasksCompletedCount))
                    .col(timestamp_col(Accounts::CreatedAt))
                    .col(timestamp_col(Accounts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_accounts_uuid", Accounts::Uuid),
            ("idx_accounts_handle", Accounts::Handle),
            ("idx_accounts_api_key_hash", Accounts::ApiKeyHash),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Accounts::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(fk_id_col(manager, Tasks::AuthorId))
                    .col(fk_id_nullable_col(manager, Tasks::AssigneeId))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Content).text().not_null())
                    .col(ColumnDef::new(Tasks::Url).string())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("open")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("medium")),
                    )
                    .col(ColumnDef::new(Tasks::Points).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tasks::AssignmentMode)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("owner_assigns")),
                    )
                    .col(ColumnDef::new(Tasks::Deadline).timestamp())
                    .col(counter_col(Tasks::PosterEscrow))
                    .col(counter_col(Tasks::AssigneeEscrow))
                    .col(
                        ColumnDef::new(Tasks::EscrowStatus)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("none")),
                    )
                    .col(ColumnDef::new(Tasks::Labels).json().not_null())
                    .col(ColumnDef::new(Tasks::RepoUrl).string())
                    .col(ColumnDef::new(Tasks::Branch).string())
                    .col(ColumnDef::new(Tasks::PrUrl).string())
                    .col(ColumnDef::new(Tasks::EstimatedEffort).string())
                    .col(ColumnDef::new(Tasks::AcceptanceCriteria).text())
                    .col(ColumnDef::new(Tasks::Tests).text())
                    .col(ColumnDef::new(Tasks::ClaimedAt).timestamp())
                    .col(ColumnDef::new(Tasks::CompletedAt).timestamp())
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_author_id")
                            .from(Tasks::Table, Tasks::AuthorId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assignee_id")
                            .from(Tasks::Table, Tasks::AssigneeId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_tasks_author_id", Tasks::AuthorId),
            ("idx_tasks_assignee_id", Tasks::AssigneeId),
            ("idx_tasks_status", Tasks::Status),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Tasks::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(PointTransactions::Table)
                    .col(pk_id_col(manager, PointTransactions::Id))
                    .col(uuid_col(PointTransactions::Uuid))
                    .col(fk_id_col(manager, PointTransactions::AccountId))
                    .col(fk_id_nullable_col(manager, PointTransactions::TaskId))
                    .col(
                        ColumnDef::new(PointTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::Kind)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointTransactions::Meta).json().not_null())
                    .col(timestamp_col(PointTransactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_point_transactions_account_id")
                            .from(PointTransactions::Table, PointTransactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_point_transactions_task_id")
                            .from(PointTransactions::Table, PointTransactions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_account_id_created_at")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::AccountId)
                    .col(PointTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_task_id")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(UserMilestones::Table)
                    .col(pk_id_col(manager, UserMilestones::Id))
                    .col(fk_id_col(manager, UserMilestones::AccountId))
                    .col(
                        ColumnDef::new(UserMilestones::Milestone)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(counter_col(UserMilestones::PointsAwarded))
                    .col(timestamp_col(UserMilestones::AwardedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_milestones_account_id")
                            .from(UserMilestones::Table, UserMilestones::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_milestones_account_id_milestone")
                    .table(UserMilestones::Table)
                    .col(UserMilestones::AccountId)
                    .col(UserMilestones::Milestone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Comments::Table)
                    .col(pk_id_col(manager, Comments::Id))
                    .col(uuid_col(Comments::Uuid))
                    .col(fk_id_col(manager, Comments::TaskId))
                    .col(fk_id_col(manager, Comments::AuthorId))
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comments::Score)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(Comments::CreatedAt))
                    .col(timestamp_col(Comments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_task_id")
                            .from(Comments::Table, Comments::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_author_id")
                            .from(Comments::Table, Comments::AuthorId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_uuid")
                    .table(Comments::Table)
                    .col(Comments::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_task_id")
                    .table(Comments::Table)
                    .col(Comments::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(CommentVotes::Table)
                    .col(pk_id_col(manager, CommentVotes::Id))
                    .col(fk_id_col(manager, CommentVotes::CommentId))
                    .col(fk_id_col(manager, CommentVotes::AccountId))
                    .col(ColumnDef::new(CommentVotes::Direction).integer().not_null())
                    .col(timestamp_col(CommentVotes::CreatedAt))
                    .col(timestamp_col(CommentVotes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_votes_comment_id")
                            .from(CommentVotes::Table, CommentVotes::CommentId)
                            .to(Comments::Table, Comments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_votes_account_id")
                            .from(CommentVotes::Table, CommentVotes::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comment_votes_comment_id_account_id")
                    .table(CommentVotes::Table)
                    .col(CommentVotes::CommentId)
                    .col(CommentVotes::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentVotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserMilestones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}

pub(crate) fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

pub(crate) fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

pub(crate) fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

pub(crate) fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

pub(crate) fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn counter_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(Expr::val(0))
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
pub(crate) enum Accounts {
    Table,
    Id,
    Uuid,
    Handle,
    Name,
    Description,
    ApiKeyHash,
    TotalPoints,
    VotePointsToday,
    VotePointsResetDate,
    TasksCompletedCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub(crate) enum Tasks {
    Table,
    Id,
    Uuid,
    AuthorId,
    AssigneeId,
    Title,
    Content,
    Url,
    Status,
    Priority,
    Points,
    AssignmentMode,
    Deadline,
    PosterEscrow,
    AssigneeEscrow,
    EscrowStatus,
    Labels,
    RepoUrl,
    Branch,
    PrUrl,
    EstimatedEffort,
    AcceptanceCriteria,
    Tests,
    ClaimedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PointTransactions {
    Table,
    Id,
    Uuid,
    AccountId,
    TaskId,
    Amount,
    Kind,
    BalanceAfter,
    Meta,
    CreatedAt,
}

#[derive(Iden)]
enum UserMilestones {
    Table,
    Id,
    AccountId,
    Milestone,
    PointsAwarded,
    AwardedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    Uuid,
    TaskId,
    AuthorId,
    Content,
    Score,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CommentVotes {
    Table,
    Id,
    CommentId,
    AccountId,
    Direction,
    CreatedAt,
    UpdatedAt,
}
