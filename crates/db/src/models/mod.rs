pub mod account;
pub mod comment;
pub mod comment_vote;
pub mod ids;
pub mod milestone;
pub mod notification_outbox;
pub mod point_transaction;
pub mod task;
