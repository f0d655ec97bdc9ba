use db::{DbErr, retry::MaybeBusy, types::TaskStatus};
use points::{EscrowError, LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Insufficient points. You need {needed} points but have {available}.")]
    InsufficientPoints { needed: i64, available: i64 },
    #[error("{0}")]
    Conservation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    pub fn task_not_found() -> Self {
        TaskError::NotFound("Task not found.".to_string())
    }

    pub fn invalid_transition(from: TaskStatus, to: TaskStatus) -> Self {
        TaskError::Conflict(format!(
            "Invalid status transition from '{from}' to '{to}'."
        ))
    }
}

impl From<LedgerError> for TaskError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Database(err) => TaskError::Database(err),
            LedgerError::InsufficientPoints { needed, available } => {
                TaskError::InsufficientPoints { needed, available }
            }
            LedgerError::AccountNotFound => TaskError::NotFound("Account not found.".to_string()),
        }
    }
}

impl From<EscrowError> for TaskError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::Ledger(err) => err.into(),
            EscrowError::StateChanged { expected, found } => TaskError::Conflict(format!(
                "Escrow status is '{found}'. Expected '{expected}'."
            )),
            EscrowError::Conservation(message) => TaskError::Conservation(message),
        }
    }
}

impl MaybeBusy for TaskError {
    fn is_busy(&self) -> bool {
        matches!(self, TaskError::Database(err) if err.is_busy())
    }
}
