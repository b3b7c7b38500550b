//! Whitepaper upload endpoint.
//!
//! `POST /api/upload`: receives a PDF as multipart field `file`, stores it
//! in the upload directory, registers a task for it and starts the
//! analysis in the background.

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::tasks::remove_source_file;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";
/// Longest stored filename component, after sanitizing.
const MAX_STORED_NAME_CHARS: usize = 100;

#[derive(Serialize)]
pub struct UploadResponse {
    pub task_id: Uuid,
    pub filename: String,
    pub message: String,
}

/// `POST /api/upload`: accept a whitepaper and start analysing it.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &ctx.core.config;
    let max_bytes = config.max_file_size_bytes();

    let (filename, data) = read_document(&mut multipart, config.max_file_size_mb).await?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }
    if data.len() as u64 > max_bytes {
        return Err(too_large(config.max_file_size_mb));
    }

    let task_id = Uuid::new_v4();
    let stored_name = format!("{task_id}_{}", sanitize_filename(&filename));
    let dir = config.upload_dir.clone();
    let path = tokio::task::spawn_blocking(move || store_upload(&dir, &stored_name, &data))
        .await
        .map_err(|e| ApiError::Internal(format!("upload task aborted: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to store upload: {e}")))?;

    let orchestrator = ctx.core.orchestrator();
    if let Err(e) = orchestrator.submit(task_id, &filename, path.clone()) {
        remove_source_file(&path);
        return Err(e.into());
    }
    // The handle is dropped; the task keeps running detached.
    orchestrator.start(task_id)?;

    tracing::info!(task_id = %task_id, filename = %filename, "Upload accepted");
    Ok(Json(UploadResponse {
        task_id,
        filename,
        message: "File uploaded successfully. Analysis started.".into(),
    }))
}

/// Pull the `file` field out of the form, checking its name before reading
/// the body.
async fn read_document(
    multipart: &mut Multipart,
    max_file_size_mb: u64,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size_mb))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".into()))?;
        if !has_pdf_extension(&filename) {
            return Err(ApiError::BadRequest("Only PDF files are supported".into()));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_size_mb))?;
        return Ok((filename, data));
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

fn multipart_error(err: MultipartError, max_file_size_mb: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_file_size_mb)
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn too_large(max_file_size_mb: u64) -> ApiError {
    ApiError::BadRequest(format!(
        "File too large. Maximum size is {max_file_size_mb}MB"
    ))
}

fn has_pdf_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reduce a client-supplied name to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let truncated: String = cleaned
        .chars()
        .rev()
        .take(MAX_STORED_NAME_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if truncated.is_empty() {
        "upload.pdf".to_string()
    } else {
        truncated
    }
}

/// Write the upload through a temp file in the same directory and move it
/// into place, so a half-written file never carries the final name.
fn store_upload(dir: &Path, stored_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    let path = dir.join(stored_name);
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(path)
}
