use async_trait::async_trait;
use db::events::NotificationPayload;

/// Delivers one notification. Delivery itself lives outside this workspace.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &NotificationPayload) -> anyhow::Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &NotificationPayload) -> anyhow::Result<()> {
        tracing::info!(
            kind = %notification.kind,
            recipient = %notification.recipient,
            actor = %notification.actor,
            task_id = ?notification.task_id,
            detail = ?notification.detail,
            "notification"
        );
        Ok(())
    }
}
