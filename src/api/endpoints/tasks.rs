//! Task lifecycle endpoints: start, poll, fetch and delete.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_task_id, ApiContext};
use crate::models::analysis::AnalysisDocument;
use crate::models::enums::TaskStatus;
use crate::tasks::remove_source_file;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub message: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub progress: u8,
    /// The failure reason, present only for failed tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ResultResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub task_id: Uuid,
    pub message: String,
}

/// `POST /api/analyze/:task_id`: start a pending task.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let id = parse_task_id(&task_id)?;
    ctx.core.orchestrator().start(id)?;
    Ok(Json(AnalyzeResponse {
        task_id: id,
        status: TaskStatus::Processing,
        message: "Analysis started".into(),
    }))
}

/// `GET /api/status/:task_id`
pub async fn status(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_task_id(&task_id)?;
    let task = ctx.core.tasks().get(&id)?;
    Ok(Json(StatusResponse {
        task_id: id,
        status: task.status(),
        progress: task.progress(),
        message: task.error().map(String::from),
    }))
}

/// `GET /api/result/:task_id`: the analysis of a completed task, or the
/// error of a failed one.
pub async fn result(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    let id = parse_task_id(&task_id)?;
    let task = ctx.core.tasks().get(&id)?;
    match task.status() {
        TaskStatus::Completed => Ok(Json(ResultResponse {
            task_id: id,
            status: TaskStatus::Completed,
            result: task.result().cloned(),
            error: None,
        })),
        TaskStatus::Failed => Ok(Json(ResultResponse {
            task_id: id,
            status: TaskStatus::Failed,
            result: None,
            error: task.error().map(String::from),
        })),
        other => Err(ApiError::InvalidState(format!(
            "Analysis not ready yet. Current status: {other}"
        ))),
    }
}

/// `DELETE /api/task/:task_id`: forget the task and remove its upload if
/// processing has not already done so.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_task_id(&task_id)?;
    let task = ctx.core.tasks().delete(&id)?;
    if let Some(path) = task.source_location() {
        remove_source_file(path);
    }
    tracing::info!(task_id = %id, "Task deleted");
    Ok(Json(DeleteResponse {
        task_id: id,
        message: "Task deleted successfully".into(),
    }))
}
