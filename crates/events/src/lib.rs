//! Drains the notification outbox that task operations write into.

use std::{sync::Arc, time::Duration};

use db::{
    DBService, entities::notification_outbox, events::NotificationPayload,
    models::notification_outbox::NotificationOutbox,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod notifier;
mod types;

pub use notifier::{LogNotifier, Notifier};
pub use types::EventError;

const OUTBOX_POLL_INTERVAL: Duration = Duration::from_millis(250);
const OUTBOX_BATCH_LIMIT: u64 = 100;
const MAX_DELIVERY_ATTEMPTS: i32 = 5;

#[derive(Clone)]
pub struct NotificationService {
    db: DBService,
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(db: DBService, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Polls the outbox until `shutdown` fires.
    pub fn spawn_worker(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = service.flush_pending().await {
                    tracing::error!(error = %err, "notification outbox flush failed");
                }
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(OUTBOX_POLL_INTERVAL) => {}
                }
            }
            tracing::debug!("notification worker stopped");
        })
    }

    /// Delivers one batch. Returns how many rows were delivered.
    pub async fn flush_pending(&self) -> Result<usize, EventError> {
        let entries = NotificationOutbox::fetch_pending(
            &self.db.pool,
            OUTBOX_BATCH_LIMIT,
            MAX_DELIVERY_ATTEMPTS,
        )
        .await?;

        let mut delivered = 0;
        for entry in entries {
            match self.dispatch_entry(&entry).await {
                Ok(()) => {
                    NotificationOutbox::mark_delivered(&self.db.pool, entry.id).await?;
                    delivered += 1;
                }
                Err(err) => {
                    let err_msg = err.to_string();
                    tracing::warn!(
                        notification_id = %entry.uuid,
                        attempts = entry.attempts + 1,
                        error = %err_msg,
                        "notification delivery failed"
                    );
                    NotificationOutbox::mark_failed(&self.db.pool, entry.id, &err_msg).await?;
                }
            }
        }
        Ok(delivered)
    }

    async fn dispatch_entry(&self, entry: &notification_outbox::Model) -> Result<(), EventError> {
        let payload: NotificationPayload = serde_json::from_value(entry.payload.clone())?;
        self.notifier.deliver(&payload).await?;
        Ok(())
    }
}
