use std::{future::Future, time::Duration};

use sea_orm::DbErr;

const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF_MS: u64 = 50;
const MAX_BACKOFF_MS: u64 = 1_000;

/// Errors that can tell whether the store refused the work because of lock contention.
pub trait MaybeBusy {
    fn is_busy(&self) -> bool;
}

impl MaybeBusy for DbErr {
    fn is_busy(&self) -> bool {
        is_busy_message(&self.to_string())
    }
}

/// Re-runs `op` from scratch while the store reports it is busy.
///
/// `op` must own its whole transaction so a retry never observes half of a
/// previous attempt.
pub async fn retry_on_busy<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    E: MaybeBusy + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_busy() && attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "store busy, retrying transaction"
                );
                tokio::time::sleep(backoff).await;
                let next_ms = (backoff.as_millis() as u64)
                    .saturating_mul(2)
                    .min(MAX_BACKOFF_MS);
                backoff = Duration::from_millis(next_ms);
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_busy_message(message: &str) -> bool {
    message.contains("database is locked")
        || message.contains("database is busy")
        || message.contains("database table is locked")
        || message.contains("could not serialize access")
        || message.contains("deadlock detected")
}
