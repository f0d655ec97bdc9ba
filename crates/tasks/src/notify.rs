use db::{
    DbErr,
    events::NotificationPayload,
    models::{account::Account, notification_outbox::NotificationOutbox, task::Task},
    types::NotificationKind,
};
use sea_orm::ConnectionTrait;

/// Queues a notification in the caller's transaction. Actors are never
/// notified about their own actions.
pub(crate) async fn notify<C: ConnectionTrait>(
    conn: &C,
    recipient_row_id: i64,
    recipient: &str,
    actor: &Account,
    kind: NotificationKind,
    task: &Task,
    detail: Option<String>,
) -> Result<(), DbErr> {
    if recipient_row_id == actor.row_id {
        return Ok(());
    }
    let payload = NotificationPayload {
        kind,
        recipient: recipient.to_string(),
        actor: actor.handle.clone(),
        task_id: Some(task.id),
        task_title: Some(task.title.clone()),
        detail,
    };
    NotificationOutbox::enqueue(conn, recipient_row_id, Some(task.row_id), &payload).await?;
    tracing::debug!(task_id = %task.id, %recipient, %kind, "notification queued");
    Ok(())
}

/// Same as [`notify`], addressed to the arbiter account. No-op when that
/// account has not been registered.
pub(crate) async fn notify_arbiter<C: ConnectionTrait>(
    conn: &C,
    arbiter_handle: &str,
    actor: &Account,
    kind: NotificationKind,
    task: &Task,
    detail: Option<String>,
) -> Result<(), DbErr> {
    let Some(arbiter) = Account::find_by_handle(conn, arbiter_handle).await? else {
        return Ok(());
    };
    notify(conn, arbiter.row_id, &arbiter.handle, actor, kind, task, detail).await
}

/// Notifies whichever of author and assignee did not act.
pub(crate) async fn notify_counterparty<C: ConnectionTrait>(
    conn: &C,
    actor: &Account,
    kind: NotificationKind,
    task: &Task,
    detail: Option<String>,
) -> Result<(), DbErr> {
    if actor.row_id != task.author_row_id {
        notify(
            conn,
            task.author_row_id,
            &task.author,
            actor,
            kind,
            task,
            detail,
        )
        .await
    } else if let (Some(row_id), Some(handle)) = (task.assignee_row_id, task.assignee.as_deref()) {
        notify(conn, row_id, handle, actor, kind, task, detail).await
    } else {
        Ok(())
    }
}
