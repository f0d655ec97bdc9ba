use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    models::{
        account::Account,
        comment::Comment,
        task::{Task, TaskFilter, TaskSort},
    },
    types::{TaskPriority, TaskStatus},
};
use serde::{Deserialize, Serialize};
use tasks::{
    AssignTask, Completion, CreateTask, CreatedTask, EscrowAcceptance, EscrowView, SettleOutcome,
    SettleTask, TaskUpdate, UpdateTask,
};
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::load_task_middleware};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Comma separated; a task must carry every listed label.
    pub labels: Option<String>,
    pub sort: Option<TaskSort>,
    pub limit: Option<u64>,
}

impl TaskListQuery {
    fn into_filter(self) -> TaskFilter {
        let labels = self
            .labels
            .map(|raw| {
                raw.split(',')
                    .map(|label| label.trim().to_lowercase())
                    .filter(|label| !label.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        TaskFilter {
            status: self.status,
            priority: self.priority,
            labels,
            sort: self.sort.unwrap_or_default(),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateComment {
    pub content: Option<String>,
}

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<TaskListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = deployment.tasks().list(&query.into_filter()).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    Extension(account): Extension<Account>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CreatedTask>>), ApiError> {
    tracing::debug!(author = %account.handle, "creating task");
    let created = deployment.tasks().create(&account, payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(created)),
    ))
}

pub async fn update_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<TaskUpdate>>, ApiError> {
    let updated = deployment
        .tasks()
        .update(&account, task.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn claim_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = deployment.tasks().claim(&account, task.id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn assign_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<AssignTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = deployment
        .tasks()
        .assign(&account, task.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn accept_escrow(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<EscrowAcceptance>>, ApiError> {
    let accepted = deployment.tasks().accept_escrow(&account, task.id).await?;
    Ok(ResponseJson(ApiResponse::success(accepted)))
}

pub async fn complete_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Completion>>, ApiError> {
    let completion = deployment.tasks().complete(&account, task.id).await?;
    Ok(ResponseJson(ApiResponse::success(completion)))
}

pub async fn settle_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SettleTask>,
) -> Result<ResponseJson<ApiResponse<SettleOutcome>>, ApiError> {
    let outcome = deployment
        .tasks()
        .settle(&account, task.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn cancel_task(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = deployment.tasks().cancel(&account, task.id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_escrow(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<EscrowView>>, ApiError> {
    let escrow = deployment.tasks().escrow(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(escrow)))
}

pub async fn get_comments(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = deployment.tasks().comments(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn create_comment(
    Extension(account): Extension<Account>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateComment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Comment>>), ApiError> {
    let comment = deployment
        .tasks()
        .add_comment(&account, task.id, payload.content.as_deref().unwrap_or_default())
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(comment)),
    ))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_actions_router = Router::new()
        .route("/claim", post(claim_task))
        .route("/assign", post(assign_task))
        .route("/accept-escrow", post(accept_escrow))
        .route("/complete", post(complete_task))
        .route("/settle", post(settle_task))
        .route("/cancel", post(cancel_task));

    let task_id_router = Router::new()
        .route("/", get(get_task).patch(update_task))
        .route("/escrow", get(get_escrow))
        .route("/comments", get(get_comments).post(create_comment))
        .merge(task_actions_router)
        .layer(from_fn_with_state(
            deployment.clone(),
            load_task_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
