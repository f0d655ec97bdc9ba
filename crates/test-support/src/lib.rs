//! Shared fixtures for the workspace's async tests.

use db::{
    DBService,
    models::{
        account::{Account, CreateAccount},
        point_transaction::{PointReason, PointTransaction},
    },
};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use uuid::Uuid;

/// In-memory SQLite with every migration applied.
pub async fn setup_db() -> DBService {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let pool = Database::connect(options).await.unwrap();
    db_migration::Migrator::up(&pool, None).await.unwrap();
    DBService { pool }
}

/// File-backed SQLite for tests that need more than one pooled connection.
///
/// Keep the returned directory alive for as long as the service is used.
pub async fn setup_file_db() -> (TempDir, DBService) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("db.sqlite").to_string_lossy()
    );
    let service = DBService::connect(&url).await.unwrap();
    (dir, service)
}

/// Registers `handle` and funds it through a `grant` ledger row.
pub async fn seed_account(db: &DBService, handle: &str, points: i64) -> Account {
    let account = Account::create(
        &db.pool,
        &CreateAccount {
            handle: handle.to_string(),
            name: handle.to_string(),
            description: None,
        },
        &format!("hash-{handle}"),
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    if points <= 0 {
        return account;
    }

    let balance = Account::apply_delta(&db.pool, account.row_id, points)
        .await
        .unwrap()
        .unwrap();
    PointTransaction::record(
        &db.pool,
        account.row_id,
        None,
        points,
        balance,
        &PointReason::Grant {
            granted_by: "test-support".to_string(),
            note: None,
        },
    )
    .await
    .unwrap();
    Account::find_by_row_id(&db.pool, account.row_id)
        .await
        .unwrap()
        .unwrap()
}

pub async fn balance_of(db: &DBService, account: &Account) -> i64 {
    Account::find_by_row_id(&db.pool, account.row_id)
        .await
        .unwrap()
        .unwrap()
        .total_points
}

/// Asserts `total_points` equals the sum of the account's ledger rows.
pub async fn assert_ledger_reconciles(db: &DBService, account_row_id: i64) {
    let account = Account::find_by_row_id(&db.pool, account_row_id)
        .await
        .unwrap()
        .unwrap();
    let sum = PointTransaction::sum_for_account(&db.pool, account_row_id)
        .await
        .unwrap();
    assert_eq!(
        account.total_points, sum,
        "ledger for {} does not reconcile",
        account.handle
    );
}
