use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::NotificationKind;

/// Body stored in the notification outbox and handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub recipient: String,
    pub actor: String,
    pub task_id: Option<Uuid>,
    pub task_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
