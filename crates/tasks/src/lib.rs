//! Task lifecycle: the status state machine and the escrow and payout steps
//! that run at its transitions.

pub mod error;
mod notify;
pub mod request;
pub mod service;

pub use error::TaskError;
pub use request::{AssignTask, CreateTask, SettleTask, UpdateTask};
pub use service::{
    Completion, CreatedTask, EscrowAcceptance, EscrowView, SettleOutcome, SettlementReport,
    TaskService, TaskUpdate,
};
