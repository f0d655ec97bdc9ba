use std::sync::Arc;

use config::{Config, load_config_from_file};
use db::{
    DBService, DbErr, DbServiceError,
    models::account::{Account, CreateAccount},
    sea_orm::SqlErr,
};
use events::{LogNotifier, NotificationService, Notifier};
use points::{Ledger, VoteRewards};
use tasks::TaskService;
use thiserror::Error;
use utils_core::assets::{asset_dir, config_path};
use uuid::Uuid;

use crate::http::auth::{generate_api_key, hash_api_key};

/// Preset API key for the arbiter account. Without it a key is minted on first boot.
pub const ARBITER_API_KEY_ENV: &str = "HIVE_ARBITER_API_KEY";
const ARBITER_KEY_FILE: &str = "arbiter_api_key";

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbServiceError),
    #[error(transparent)]
    Store(#[from] DbErr),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state shared by every route handler.
#[derive(Clone)]
pub struct DeploymentImpl {
    db: DBService,
    config: Arc<Config>,
    tasks: TaskService,
    ledger: Ledger,
    votes: VoteRewards,
    notifications: NotificationService,
}

impl DeploymentImpl {
    /// Loads `config.json` from the asset dir and connects to `DATABASE_URL`.
    pub async fn new() -> Result<Self, DeploymentError> {
        let config = load_config_from_file(&config_path()?).await;
        let db = DBService::new().await?;
        tracing::info!(
            arbiter = %config.arbiter_handle,
            config_version = %config.config_version,
            "deployment ready"
        );
        let deployment = Self::from_parts(db, config, Arc::new(LogNotifier));

        let preset_key = std::env::var(ARBITER_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let from_env = preset_key.is_some();
        let minted = deployment.ensure_arbiter(preset_key).await?;
        if let Some(api_key) = minted.filter(|_| !from_env) {
            let key_path = asset_dir()?.join(ARBITER_KEY_FILE);
            tokio::fs::write(&key_path, format!("{api_key}\n")).await?;
            tracing::warn!(
                path = %key_path.display(),
                "arbiter API key written; move it somewhere safe and delete the file"
            );
        }
        Ok(deployment)
    }

    /// Creates the arbiter account when it does not exist yet.
    ///
    /// Returns the API key the account was created with, or `None` when the
    /// account was already there.
    pub async fn ensure_arbiter(
        &self,
        api_key: Option<String>,
    ) -> Result<Option<String>, DeploymentError> {
        let handle = &self.config.arbiter_handle;
        let pool = &self.db.pool;
        if Account::find_by_handle(pool, handle).await?.is_some() {
            return Ok(None);
        }

        let api_key = api_key.unwrap_or_else(generate_api_key);
        let data = CreateAccount {
            handle: handle.clone(),
            name: handle.clone(),
            description: Some("Settles escrow disputes and grants points.".to_string()),
        };
        match Account::create(pool, &data, &hash_api_key(&api_key), Uuid::new_v4()).await {
            Ok(account) => {
                tracing::info!(handle = %account.handle, "arbiter account provisioned");
                Ok(Some(api_key))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn from_parts(db: DBService, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tasks: TaskService::new(db.clone(), &config),
            ledger: Ledger::new(db.clone()),
            votes: VoteRewards::new(db.clone(), config.economy.clone()),
            notifications: NotificationService::new(db.clone(), notifier),
            config: Arc::new(config),
            db,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn votes(&self) -> &VoteRewards {
        &self.votes
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }
}
