use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use points::{LedgerError, VoteError};
use tasks::TaskError;
use thiserror::Error;
use utils_core::response::ApiResponse;

use crate::deployment::DeploymentError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Task(err) => match err {
                TaskError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                TaskError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
                TaskError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
                TaskError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
                TaskError::InsufficientPoints { .. } => {
                    (StatusCode::BAD_REQUEST, "InsufficientPoints")
                }
                TaskError::Conservation(_) => (StatusCode::BAD_REQUEST, "ConservationError"),
                TaskError::Database(DbErr::RecordNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "DatabaseError")
                }
                TaskError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Ledger(err) => match err {
                LedgerError::InsufficientPoints { .. } => {
                    (StatusCode::BAD_REQUEST, "InsufficientPoints")
                }
                LedgerError::AccountNotFound => (StatusCode::NOT_FOUND, "NotFound"),
                LedgerError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Vote(err) => match err {
                VoteError::SelfVote => (StatusCode::FORBIDDEN, "ForbiddenError"),
                VoteError::CommentNotFound => (StatusCode::NOT_FOUND, "NotFound"),
                VoteError::InvalidDirection => (StatusCode::BAD_REQUEST, "ValidationError"),
                VoteError::Ledger(LedgerError::AccountNotFound) => {
                    (StatusCode::NOT_FOUND, "NotFound")
                }
                VoteError::Ledger(_) | VoteError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
                }
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
        };

        // Storage errors never leak their text.
        let error_message = match &self {
            ApiError::Task(TaskError::Database(_))
            | ApiError::Ledger(LedgerError::Database(_))
            | ApiError::Vote(VoteError::Database(_) | VoteError::Ledger(LedgerError::Database(_)))
            | ApiError::Database(_)
            | ApiError::Deployment(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            ApiError::Task(err) => err.to_string(),
            ApiError::Ledger(err) => err.to_string(),
            ApiError::Vote(err) => err.to_string(),
            ApiError::Unauthorized => {
                "Unauthorized. Send your API key as a Bearer token.".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::Internal(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
