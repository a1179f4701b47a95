//! Task resource handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::task::{validate_title, TitleViolation, TITLE_MAX_CHARS, TITLE_MIN_CHARS};
use crate::store::Task;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub db: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    state.store.run(|conn| conn.ping()).await?;
    Ok(Json(HealthStatus {
        status: "ok",
        db: "ok",
    }))
}

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.run(|conn| conn.list_tasks()).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(body) = payload?;
    let title = parse_title(&body)?;

    let task = state
        .store
        .run(move |conn| conn.insert_task(&title))
        .await?;

    tracing::debug!(task_id = task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn mark_done(
    State(state): State<AppState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(task_id) = task_id?;
    let task = state.store.run(move |conn| conn.mark_done(task_id)).await?;

    tracing::debug!(task_id, "Task marked done");
    Ok(Json(task))
}

pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
        state.metrics.render(),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Pull a valid `title` out of a create-task body.
fn parse_title(body: &Value) -> Result<String, ApiError> {
    let Some(fields) = body.as_object() else {
        return Err(ApiError::invalid(
            &["body"],
            "model_attributes_type",
            "Input should be a valid dictionary or object to extract fields from",
        ));
    };

    let title = match fields.get("title") {
        None => {
            return Err(ApiError::invalid(&["body", "title"], "missing", "Field required"));
        }
        Some(Value::String(title)) => title,
        Some(_) => {
            return Err(ApiError::invalid(
                &["body", "title"],
                "string_type",
                "Input should be a valid string",
            ));
        }
    };

    match validate_title(title) {
        Ok(()) => Ok(title.clone()),
        Err(TitleViolation::TooShort) => Err(ApiError::invalid(
            &["body", "title"],
            "string_too_short",
            format!("String should have at least {TITLE_MIN_CHARS} character"),
        )),
        Err(TitleViolation::TooLong) => Err(ApiError::invalid(
            &["body", "title"],
            "string_too_long",
            format!("String should have at most {TITLE_MAX_CHARS} characters"),
        )),
    }
}
