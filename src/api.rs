//! HTTP surface of the task store.
//!
//! | Method | Path              | Success          |
//! |--------|-------------------|------------------|
//! | GET    | `/api/tasks`      | 200, `[Task]`    |
//! | POST   | `/api/tasks`      | 201, `Task`      |
//! | PUT    | `/api/tasks/{id}` | 200, `Task`      |
//! | DELETE | `/api/tasks/{id}` | 200, `{message}` |

use axum::extract::{Path, Query, State};
use axum::http::{header::CONTENT_TYPE, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::StoreError;
use crate::store::SharedStore;
use crate::task::{StatusFilter, Task, TaskPatch};

pub const NOT_FOUND_MESSAGE: &str = "Task not found";
pub const DELETED_MESSAGE: &str = "Task deleted successfully";

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", NOT_FOUND_MESSAGE)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<StoreError> for ApiErrorResponse {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::not_found(),
            StoreError::BlankTitle => Self::validation("Title is required"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Routes only, no middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .with_state(state)
}

/// Routes plus request tracing and the CORS policy for the configured origin.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    router(state).layer(TraceLayer::new_for_http()).layer(cors)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Task>> {
    let filter = StatusFilter::from_query(query.status.as_deref());
    let tasks = state.store.lock().await.list(filter);
    tracing::debug!(?filter, count = tasks.len(), "Listed tasks");
    Json(tasks)
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiErrorResponse> {
    let title = request.title.unwrap_or_default();
    let task = state.store.lock().await.create(&title)?;
    tracing::info!(task_id = %task.id, title = %task.title, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let result = state.store.lock().await.update(&id, &patch);
    match result {
        Ok(task) => {
            tracing::info!(task_id = %task.id, completed = task.completed, "Updated task");
            Ok(Json(task))
        }
        Err(error) => {
            tracing::info!(task_id = %id, %error, "Update rejected");
            Err(error.into())
        }
    }
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let result = state.store.lock().await.delete(&id);
    match result {
        Ok(task) => {
            tracing::info!(task_id = %task.id, title = %task.title, "Deleted task");
            Ok(Json(MessageResponse {
                message: DELETED_MESSAGE.to_string(),
            }))
        }
        Err(error) => {
            tracing::info!(task_id = %id, %error, "Delete rejected");
            Err(error.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_maps_to_404() {
        let response = ApiErrorResponse::from(StoreError::NotFound("7".to_string()));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.code, "NOT_FOUND");
        assert_eq!(response.error.message, NOT_FOUND_MESSAGE);
    }

    #[rstest]
    fn blank_title_maps_to_400() {
        let response = ApiErrorResponse::from(StoreError::BlankTitle);
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
    }
}
