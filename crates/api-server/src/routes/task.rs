//! Task API endpoints
//!
//! RESTful API for task CRUD operations under `/api/v1/tasks`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Deserialize;

use tm_core::task::{NewTask, Task, TaskPatch};
use tm_core::{Error, RequestContext};

use super::{bad_request, internal_error, not_found, route_error, RouteError};
use crate::delay::parse_delay;
use crate::middleware::{json_content_type, request_context, require_basic_auth};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub delay: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Map a service failure onto a response. Cancellation kinds get their own
/// statuses; everything else is a server fault reported as `failure`.
fn service_error(err: Error, failure: &str) -> RouteError {
    match err {
        Error::DeadlineExceeded => {
            tracing::warn!("Request timed out");
            route_error(StatusCode::REQUEST_TIMEOUT, "Request timeout")
        }
        Error::Cancelled => {
            tracing::debug!("Request cancelled");
            route_error(StatusCode::SERVICE_UNAVAILABLE, "Request cancelled")
        }
        Error::Validation(message) => bad_request(message),
        other => {
            tracing::error!("{}: {}", failure, other);
            internal_error(failure)
        }
    }
}

fn task_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, RouteError> {
    path.map(|Path(id)| id).map_err(|_| bad_request("Invalid ID"))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RouteError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| bad_request(format!("Invalid JSON: {}", rejection.body_text())))
}

fn task_not_found() -> RouteError {
    not_found("Task not found")
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/tasks - List all tasks
async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, RouteError> {
    let delay = match query.delay.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_delay(raw).map_err(|e| {
            bad_request(format!(
                "Invalid delay ({}). Use e.g. ?delay=200ms or ?delay=2s",
                e
            ))
        })?),
    };

    let tasks = state
        .service()
        .list(&ctx, delay)
        .await
        .map_err(|e| service_error(e, "Failed to load tasks"))?;

    Ok(Json(tasks))
}

/// POST /api/v1/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), RouteError> {
    let new = json_body(body)?;
    new.validate().map_err(|e| service_error(e, "Invalid task"))?;

    let created = state
        .service()
        .create(&ctx, new)
        .await
        .map_err(|e| service_error(e, "Failed to save task"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Task>, RouteError> {
    let id = task_id(path)?;

    let task = state
        .service()
        .get(&ctx, id)
        .await
        .map_err(|e| service_error(e, "Failed to get task"))?;

    task.map(Json).ok_or_else(task_not_found)
}

/// PUT|PATCH /api/v1/tasks/{id} - Apply a partial update
async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, RouteError> {
    let id = task_id(path)?;
    let patch = json_body(body)?;
    patch.validate().map_err(|e| service_error(e, "Invalid task"))?;

    let updated = state
        .service()
        .update(&ctx, id, &patch)
        .await
        .map_err(|e| service_error(e, "Failed to save tasks"))?;

    updated.map(Json).ok_or_else(task_not_found)
}

/// DELETE /api/v1/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, RouteError> {
    let id = task_id(path)?;

    let deleted = state
        .service()
        .delete(&ctx, id)
        .await
        .map_err(|e| service_error(e, "Failed to save tasks"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found())
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: &AppState) -> Router<AppState> {
    let guarded_delete = delete(delete_task).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_basic_auth,
    ));

    Router::new()
        .route("/api/v1/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/v1/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .merge(guarded_delete),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_context,
        ))
        .layer(json_content_type())
}
