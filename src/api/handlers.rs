//! HTTP handlers for the task endpoints.
//!
//! Every task handler takes [`AuthenticatedUser`] as its first extractor, so
//! an unauthenticated request is answered with 401 before the body is read
//! and before storage is touched. Body and path rejections are taken as
//! `Result`s and mapped to 400 after authentication.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};

use super::auth::AuthenticatedUser;
use super::dto::{
    CreateTaskRequest, DeleteResponse, DeleteTaskRequest, ListTasksQuery, TaskResponse,
    UpdateTaskByIdRequest, UpdateTaskRequest, validate_create_request, validate_update_request,
};
use super::error::ApiErrorResponse;
use crate::domain::{OwnerId, TaskFilter, TaskId};
use crate::infrastructure::{Infrastructure, SessionVerifier, TaskRepository};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Session verifier for authenticating callers.
    pub session_verifier: Arc<dyn SessionVerifier + Send + Sync>,
}

impl AppState {
    /// Creates a new `AppState` from initialized infrastructure.
    #[must_use]
    pub fn from_infrastructure(infrastructure: Infrastructure) -> Self {
        Self {
            task_repository: infrastructure.task_repository,
            session_verifier: infrastructure.session_verifier,
        }
    }
}

// =============================================================================
// GET /tasks Handler
// =============================================================================

/// Lists the caller's tasks, newest first.
///
/// # Query Parameters
///
/// - `status`: `all` (default), `active` or `completed`
/// - `q`: case-insensitive substring of the title
///
/// # Errors
///
/// - 401 if unauthenticated
/// - 400 if the query string is malformed
/// - 500 if storage fails
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let Query(query) = query?;
    let filter = TaskFilter::new(
        query.status.unwrap_or_default(),
        query.q.as_deref().unwrap_or_default(),
    );

    let tasks = state.task_repository.list(&user.user_id).await?;

    tracing::debug!(owner = %user.user_id, count = tasks.len(), "Listed tasks");

    Ok(Json(
        filter.apply(tasks).into_iter().map(TaskResponse::from).collect(),
    ))
}

// =============================================================================
// POST /tasks Handler
// =============================================================================

/// Creates a task owned by the caller.
///
/// # Request Body
///
/// ```json
/// { "title": "Buy milk", "description": "Optional" }
/// ```
///
/// `task` is accepted in place of `title`.
///
/// # Errors
///
/// - 401 if unauthenticated
/// - 400 if the body is malformed or the title is empty
/// - 500 if storage fails
pub async fn create_task(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    let new_task = validate_create_request(&request)?;

    let task = state
        .task_repository
        .insert(&user.user_id, new_task)
        .await?;

    tracing::info!(owner = %user.user_id, task_id = %task.id, "Created task");

    Ok(Json(TaskResponse::from(task)))
}

// =============================================================================
// PATCH /tasks/{id}/complete Handler
// =============================================================================

/// Flips the completion flag of one of the caller's tasks.
///
/// # Errors
///
/// - 401 if unauthenticated
/// - 400 if the id is not a number
/// - 404 if the task is missing or owned by someone else
/// - 500 if storage fails
pub async fn toggle_task(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Path(id) = path?;
    let id = TaskId::new(id);

    let task = state.task_repository.toggle(&user.user_id, id).await?;

    tracing::info!(
        owner = %user.user_id,
        task_id = %id,
        completed = task.completed,
        "Toggled task"
    );

    Ok(Json(TaskResponse::from(task)))
}

// =============================================================================
// PATCH /tasks/{id} Handler
// =============================================================================

/// Partially updates one of the caller's tasks.
///
/// # Request Body
///
/// Any non-empty subset of:
///
/// ```json
/// { "title": "New title", "description": "New description", "completed": true }
/// ```
///
/// # Errors
///
/// - 401 if unauthenticated
/// - 400 if the id or body is malformed, or the body changes nothing
/// - 404 if the task is missing or owned by someone else
/// - 500 if storage fails
pub async fn update_task(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let patch = validate_update_request(&request)?;
    let id = TaskId::new(id);

    let task = state
        .task_repository
        .update(&user.user_id, id, patch)
        .await?;

    tracing::info!(owner = %user.user_id, task_id = %id, "Updated task");

    Ok(Json(TaskResponse::from(task)))
}

// =============================================================================
// PATCH /tasks Handler
// =============================================================================

/// Partially updates the task named in the body.
///
/// # Request Body
///
/// ```json
/// { "id": 1, "completed": true }
/// ```
///
/// Accepts the same fields as [`update_task`] next to `id`.
///
/// # Errors
///
/// Same as [`update_task`].
pub async fn update_task_by_body(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<UpdateTaskByIdRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    let patch = validate_update_request(&request.changes)?;

    let task = state
        .task_repository
        .update(&user.user_id, request.id, patch)
        .await?;

    tracing::info!(owner = %user.user_id, task_id = %request.id, "Updated task");

    Ok(Json(TaskResponse::from(task)))
}

// =============================================================================
// DELETE /tasks/{id} Handler
// =============================================================================

/// Deletes one of the caller's tasks.
///
/// # Response
///
/// ```json
/// { "message": "Deleted successfully" }
/// ```
///
/// # Errors
///
/// - 401 if unauthenticated
/// - 400 if the id is not a number
/// - 404 if the task is missing or owned by someone else
/// - 500 if storage fails
pub async fn delete_task(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiErrorResponse> {
    let Path(id) = path?;
    remove_task(&state, &user.user_id, TaskId::new(id)).await
}

/// Deletes the task named in the body (`{ "id": 1 }`).
///
/// # Errors
///
/// Same as [`delete_task`].
pub async fn delete_task_by_body(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<DeleteTaskRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiErrorResponse> {
    let Json(request) = payload?;
    remove_task(&state, &user.user_id, request.id).await
}

async fn remove_task(
    state: &AppState,
    owner: &OwnerId,
    id: TaskId,
) -> Result<Json<DeleteResponse>, ApiErrorResponse> {
    state.task_repository.delete(owner, id).await?;

    tracing::info!(owner = %owner, task_id = %id, "Deleted task");

    Ok(Json(DeleteResponse::deleted()))
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint. Does not require a session.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
