use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::{
    DBService,
    models::{account::Account, task::Task},
};
use uuid::Uuid;

use crate::DeploymentImpl;

/// The account named by a `{handle}` path segment. Kept apart from the
/// caller's own [`Account`] extension.
#[derive(Debug, Clone)]
pub struct HandleAccount(pub Account);

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl ModelLoaderDeps for DeploymentImpl {
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_key: &(dyn Display + Sync),
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_key} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_key}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_key: &(dyn Display + Sync),
    load_future: Fut,
) -> Result<Response, StatusCode>
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model_or_status(model_name, model_key, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_task_middleware<S>(
    State(deployment): State<S>,
    Path(task_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Task",
        &task_id,
        Task::find_by_id(&deployment.db_service().pool, task_id),
    )
    .await
}

/// Handles are matched case-insensitively and may carry a leading `@`.
pub async fn load_account_middleware<S>(
    State(deployment): State<S>,
    Path(handle): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let handle = handle.trim().trim_start_matches('@').to_lowercase();
    load_request_extension(
        request,
        next,
        "Account",
        &handle,
        async {
            Account::find_by_handle(&deployment.db_service().pool, &handle)
                .await
                .map(|account| account.map(HandleAccount))
        },
    )
    .await
}
