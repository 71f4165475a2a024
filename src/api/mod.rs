//! API module for HTTP handlers.
//!
//! This module contains route definitions, request/response handlers, the
//! session extractor and the route gate.

pub mod auth;
pub mod dto;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod router;

pub use auth::{AuthenticatedUser, credentials_from_headers, has_session_cookie};
pub use dto::{
    CreateTaskRequest, DeleteResponse, DeleteTaskRequest, ListTasksQuery, TaskResponse,
    UpdateTaskByIdRequest, UpdateTaskRequest,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use gate::{GateDecision, evaluate, route_gate};
pub use handlers::{
    AppState, HealthResponse, create_task, delete_task, delete_task_by_body, health_check,
    list_tasks, toggle_task, update_task, update_task_by_body,
};
pub use router::build_router;
