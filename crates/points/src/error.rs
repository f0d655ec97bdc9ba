use db::{DbErr, retry::MaybeBusy, types::EscrowStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Insufficient points. You need {needed} points but have {available}.")]
    InsufficientPoints { needed: i64, available: i64 },
    #[error("Account not found")]
    AccountNotFound,
}

impl MaybeBusy for LedgerError {
    fn is_busy(&self) -> bool {
        matches!(self, LedgerError::Database(err) if err.is_busy())
    }
}

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Escrow state changed: expected '{expected}' but found '{found}'.")]
    StateChanged {
        expected: EscrowStatus,
        found: EscrowStatus,
    },
    #[error("{0}")]
    Conservation(String),
}

impl From<DbErr> for EscrowError {
    fn from(err: DbErr) -> Self {
        EscrowError::Ledger(LedgerError::Database(err))
    }
}

impl MaybeBusy for EscrowError {
    fn is_busy(&self) -> bool {
        matches!(self, EscrowError::Ledger(err) if err.is_busy())
    }
}

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("You cannot vote on your own comment.")]
    SelfVote,
    #[error("Comment not found.")]
    CommentNotFound,
    #[error("direction must be 1, -1, or 0.")]
    InvalidDirection,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl MaybeBusy for VoteError {
    fn is_busy(&self) -> bool {
        match self {
            VoteError::Database(err) => err.is_busy(),
            VoteError::Ledger(err) => err.is_busy(),
            _ => false,
        }
    }
}
