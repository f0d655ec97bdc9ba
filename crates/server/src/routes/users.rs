use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    DbErr,
    models::{
        account::{Account, CreateAccount},
        point_transaction::PointTransaction,
    },
    sea_orm::SqlErr,
};
use config::Tier;
use points::{
    Reconciliation, TierInfo,
    tiers::{tier_for_points, tier_info},
};
use serde::{Deserialize, Serialize};
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    http::auth::{generate_api_key, hash_api_key},
    middleware::{HandleAccount, load_account_middleware},
};

const HANDLE_MIN_LEN: usize = 3;
const HANDLE_MAX_LEN: usize = 30;
const LEADERBOARD_DEFAULT_LIMIT: u64 = 10;
const LEADERBOARD_MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredAccount {
    pub account: Account,
    /// Only returned here; the server keeps a SHA-256 digest.
    pub api_key: String,
    pub tier: TierInfo,
}

#[derive(Debug, Serialize)]
pub struct AccountProfile {
    #[serde(flatten)]
    pub account: Account,
    pub tier: TierInfo,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GrantRequest {
    pub amount: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub handle: String,
    pub points: i64,
    pub tier: Tier,
}

fn valid_handle(handle: &str) -> bool {
    (HANDLE_MIN_LEN..=HANDLE_MAX_LEN).contains(&handle.len())
        && handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn handle_taken() -> ApiError {
    ApiError::Conflict("Handle already exists.".to_string())
}

fn require_self(caller: &Account, target: &Account, what: &str) -> Result<(), ApiError> {
    if caller.row_id != target.row_id {
        return Err(ApiError::Forbidden(format!(
            "You can only view your own {what}."
        )));
    }
    Ok(())
}

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<RegisteredAccount>>), ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let handle = payload
        .handle
        .as_deref()
        .map(|handle| handle.trim().to_lowercase())
        .filter(|handle| !handle.is_empty());
    let (Some(name), Some(handle)) = (name, handle) else {
        return Err(ApiError::BadRequest(
            "`name` and `handle` are required.".to_string(),
        ));
    };
    if !valid_handle(&handle) {
        return Err(ApiError::BadRequest(format!(
            "Invalid handle. Use {HANDLE_MIN_LEN}-{HANDLE_MAX_LEN} characters: lowercase letters, numbers, underscores."
        )));
    }

    if handle == deployment.config().arbiter_handle {
        return Err(ApiError::Forbidden(format!("Handle `{handle}` is reserved.")));
    }

    let pool = &deployment.db().pool;
    if Account::find_by_handle(pool, &handle).await?.is_some() {
        return Err(handle_taken());
    }

    let api_key = generate_api_key();
    let data = CreateAccount {
        handle,
        name: name.to_string(),
        description: payload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_string),
    };
    let account = match Account::create(pool, &data, &hash_api_key(&api_key), Uuid::new_v4()).await
    {
        Ok(account) => account,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(handle_taken());
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(handle = %account.handle, "account registered");

    let tier = tier_info(account.total_points, &deployment.config().economy.tiers);
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(RegisteredAccount {
            account,
            api_key,
            tier,
        })),
    ))
}

pub async fn get_me(
    Extension(account): Extension<Account>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<AccountProfile>>, ApiError> {
    let account = Account::find_by_row_id(&deployment.db().pool, account.row_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Account not found".to_string()))?;
    let tier = tier_info(account.total_points, &deployment.config().economy.tiers);
    Ok(ResponseJson(ApiResponse::success(AccountProfile {
        account,
        tier,
    })))
}

pub async fn grant_points(
    Extension(account): Extension<Account>,
    Extension(HandleAccount(target)): Extension<HandleAccount>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<GrantRequest>,
) -> Result<ResponseJson<ApiResponse<PointTransaction>>, ApiError> {
    let arbiter = &deployment.config().arbiter_handle;
    if account.handle != *arbiter {
        return Err(ApiError::Forbidden(format!(
            "Only @{arbiter} can grant points."
        )));
    }
    let amount = match payload.amount {
        Some(amount) if amount >= 1 => amount,
        _ => {
            return Err(ApiError::BadRequest(
                "amount must be a positive integer.".to_string(),
            ));
        }
    };
    let note = payload
        .note
        .map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty());

    let row = deployment
        .ledger()
        .grant(target.row_id, amount, &account.handle, note)
        .await?;
    Ok(ResponseJson(ApiResponse::success(row)))
}

pub async fn get_transactions(
    Extension(account): Extension<Account>,
    Extension(HandleAccount(target)): Extension<HandleAccount>,
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<TransactionsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<PointTransaction>>>, ApiError> {
    require_self(&account, &target, "transactions")?;
    let rows = deployment
        .ledger()
        .history(target.row_id, query.limit)
        .await?;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub async fn reconcile_transactions(
    Extension(account): Extension<Account>,
    Extension(HandleAccount(target)): Extension<HandleAccount>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Reconciliation>>, ApiError> {
    require_self(&account, &target, "ledger")?;
    let reconciliation = deployment.ledger().reconcile(target.row_id).await?;
    if !reconciliation.consistent {
        tracing::warn!(
            account = %target.handle,
            total_points = reconciliation.total_points,
            ledger_sum = reconciliation.ledger_sum,
            "ledger out of balance"
        );
    }
    Ok(ResponseJson(ApiResponse::success(reconciliation)))
}

pub async fn get_leaderboard(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<LeaderboardEntry>>>, ApiError> {
    let limit = query
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT)
        .min(LEADERBOARD_MAX_LIMIT);
    let thresholds = &deployment.config().economy.tiers;
    let entries = Account::leaderboard(&deployment.db().pool, limit)
        .await?
        .into_iter()
        .enumerate()
        .map(|(index, account)| LeaderboardEntry {
            rank: index + 1,
            tier: tier_for_points(account.total_points, thresholds),
            points: account.total_points,
            handle: account.handle,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// Routes reachable without an API key.
pub fn public_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/register", post(register))
        .route("/leaderboard", get(get_leaderboard))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let handle_router = Router::new()
        .route("/grant", post(grant_points))
        .route("/transactions", get(get_transactions))
        .route("/transactions/reconcile", get(reconcile_transactions))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_account_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/me", get(get_me))
        .nest("/{handle}", handle_router);

    Router::new().nest("/users", inner)
}

#[cfg(test)]
mod tests {
    use super::valid_handle;

    #[test]
    fn handle_rules() {
        assert!(valid_handle("worker_bee"));
        assert!(valid_handle("abc"));
        assert!(!valid_handle("ab"));
        assert!(!valid_handle("has-dash"));
        assert!(!valid_handle("UPPER"));
        assert!(!valid_handle(&"x".repeat(31)));
    }
}
