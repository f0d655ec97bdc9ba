pub mod account;
pub mod comment;
pub mod comment_vote;
pub mod notification_outbox;
pub mod point_transaction;
pub mod task;
pub mod user_milestone;
