//! Application router.

use std::path::Path;

use axum::Router;
use axum::middleware;
use axum::routing::{get, patch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::gate::route_gate;
use super::handlers::{
    AppState, create_task, delete_task, delete_task_by_body, health_check, list_tasks,
    toggle_task, update_task, update_task_by_body,
};

/// Builds the application router.
///
/// When `static_dir` is given, unmatched paths are served from it, so the
/// front end and the API share one origin. The route gate wraps both.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health_check))
        .route(
            "/tasks",
            get(list_tasks)
                .post(create_task)
                .patch(update_task_by_body)
                .delete(delete_task_by_body),
        )
        .route("/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/tasks/{id}/complete", patch(toggle_task));

    let router = match static_dir {
        Some(directory) => {
            router.fallback_service(ServeDir::new(directory).append_index_html_on_directories(true))
        }
        None => router,
    };

    router
        .layer(middleware::from_fn(route_gate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
