use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::account::Account;
use points::VoteOutcome;
use serde::{Deserialize, Serialize};
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    /// `1` up, `-1` down, `0` removes the caller's vote.
    pub direction: i32,
}

pub async fn vote_on_comment(
    Extension(account): Extension<Account>,
    State(deployment): State<DeploymentImpl>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<ResponseJson<ApiResponse<VoteOutcome>>, ApiError> {
    let outcome = deployment
        .votes()
        .vote(&account, comment_id, payload.direction)
        .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/comments/{comment_id}/vote", post(vote_on_comment))
}
