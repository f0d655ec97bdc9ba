use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use utils_core::assets::database_path;

pub mod entities;
pub mod events;
pub mod models;
pub mod retry;
pub mod types;

pub use sea_orm::{self, DatabaseTransaction, DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Failed to resolve database path: {0}")]
    Path(#[from] std::io::Error),
}

/// Shared store handle. Cloned into every service; there is no global pool.
#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects using `DATABASE_URL`, falling back to the SQLite file in the asset dir.
    pub async fn new() -> Result<DBService, DbServiceError> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => format!(
                "sqlite://{}?mode=rwc",
                database_path()?.to_string_lossy()
            ),
        };
        Ok(Self::connect(&database_url).await?)
    }

    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);
        let pool = Database::connect(options).await?;

        let is_file_sqlite = pool.get_database_backend() == DatabaseBackend::Sqlite
            && !database_url.contains(":memory:");
        if is_file_sqlite {
            pool.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
            pool.execute_unprepared("PRAGMA busy_timeout=5000;").await?;
        }

        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!(backend = ?pool.get_database_backend(), "database ready");
        Ok(DBService { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Account;

    #[tokio::test]
    async fn connect_runs_migrations_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("db.sqlite").to_string_lossy()
        );
        let service = DBService::connect(&url).await.unwrap();
        assert!(
            Account::find_by_handle(&service.pool, "nobody")
                .await
                .unwrap()
                .is_none()
        );

        let reopened = DBService::connect(&url).await.unwrap();
        assert!(
            Account::find_by_handle(&reopened.pool, "nobody")
                .await
                .unwrap()
                .is_none()
        );
    }
}
