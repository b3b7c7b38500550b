//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub llm_configured: bool,
    pub version: &'static str,
}

/// `GET /api/health`: liveness plus whether analyses can run at all.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        llm_configured: ctx.core.llm_configured(),
        version: crate::config::APP_VERSION,
    }))
}
