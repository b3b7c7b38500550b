//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the API router over shared application state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let config = &ctx.core.config;
    let body_limit = usize::try_from(config.max_file_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = cors_layer(&config.cors_origins);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/upload", post(endpoints::documents::upload))
        .route("/analyze/:task_id", post(endpoints::tasks::analyze))
        .route("/status/:task_id", get(endpoints::tasks::status))
        .route("/result/:task_id", get(endpoints::tasks::result))
        .route("/task/:task_id", delete(endpoints::tasks::remove))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
}

/// CORS for the configured origins. No origins means any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::AppConfig;
    use crate::pipeline::extraction::{DocumentExtractor, MockDocumentExtractor};
    use crate::pipeline::structuring::{LlmClient, MockLlmClient};
    use crate::tasks::InMemoryTaskStore;

    const TEXT: &str = "Nova Protocol is a sharded proof of stake network for cross chain settlement.";
    const GOOD: &str = r#"{"executive_analysis": {"project_name": "Nova"}, "overall_assessment": {"investment_recommendation": "Buy"}}"#;
    const BOUNDARY: &str = "finsight-test-boundary";

    struct TestApp {
        router: Router,
        core: Arc<CoreState>,
        dir: tempfile::TempDir,
    }

    fn test_app(extractor: impl DocumentExtractor + 'static, llm: Option<Arc<dyn LlmClient>>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().join("uploads"),
            max_file_size_mb: 1,
            ..AppConfig::default()
        };
        let core = Arc::new(CoreState::with_components(
            config,
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(extractor),
            llm,
        ));
        TestApp {
            router: api_router(core.clone()),
            core,
            dir,
        }
    }

    fn working_app() -> TestApp {
        test_app(
            MockDocumentExtractor::new(TEXT),
            Some(Arc::new(MockLlmClient::new(GOOD))),
        )
    }

    fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn wait_for_terminal(router: &Router, task_id: &str) -> serde_json::Value {
        for _ in 0..200 {
            let (_, json) = send(router, request("GET", &format!("/api/status/{task_id}"))).await;
            if json["status"] == "completed" || json["status"] == "failed" {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} never finished");
    }

    #[tokio::test]
    async fn health_reports_llm_configuration() {
        let app = working_app();
        let (status, json) = send(&app.router, request("GET", "/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["llm_configured"], true);

        let app = test_app(MockDocumentExtractor::new(TEXT), None);
        let (_, json) = send(&app.router, request("GET", "/api/health")).await;
        assert_eq!(json["llm_configured"], false);
    }

    #[tokio::test]
    async fn upload_runs_the_analysis_to_completion() {
        let app = working_app();
        let (status, json) = send(&app.router, upload_request("Nova Paper.pdf", b"%PDF-1.4 body %%EOF")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["filename"], "Nova Paper.pdf");
        let task_id = json["task_id"].as_str().unwrap().to_string();

        let final_status = wait_for_terminal(&app.router, &task_id).await;
        assert_eq!(final_status["status"], "completed");
        assert_eq!(final_status["progress"], 100);
        assert!(final_status.get("message").is_none());

        let (status, json) = send(&app.router, request("GET", &format!("/api/result/{task_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"]["executive_analysis"]["project_name"], "Nova");
        assert_eq!(json["result"]["overall_assessment"]["investment_recommendation"], "Buy");
        assert!(json.get("error").is_none());

        // The upload is removed once processing ends.
        let leftover = std::fs::read_dir(app.dir.path().join("uploads")).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn failed_task_reports_its_error() {
        let app = test_app(MockDocumentExtractor::new(TEXT), None);
        let (_, json) = send(&app.router, upload_request("paper.pdf", b"%PDF-1.4")).await;
        let task_id = json["task_id"].as_str().unwrap().to_string();

        let final_status = wait_for_terminal(&app.router, &task_id).await;
        assert_eq!(final_status["status"], "failed");
        assert_eq!(final_status["progress"], 0);
        let message = final_status["message"].as_str().unwrap();
        assert!(message.starts_with("Model API is not configured"));

        let (status, json) = send(&app.router, request("GET", &format!("/api/result/{task_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], message);
        assert!(json.get("result").is_none());
    }

    #[tokio::test]
    async fn upload_rejects_non_pdf_names() {
        let app = working_app();
        let (status, json) = send(&app.router, upload_request("notes.docx", b"PK")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Only PDF files are supported");
        assert!(app.core.tasks().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_oversize_files() {
        let app = working_app();
        let content = vec![b'x'; 1024 * 1024 + 1];
        let (status, json) = send(&app.router, upload_request("big.pdf", &content)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"].as_str().unwrap().contains("1MB"));
        assert!(app.core.tasks().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_requires_file_field() {
        let app = working_app();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_starts_pending_task_once() {
        let app = working_app();
        let id = Uuid::new_v4();
        let path = app.dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        app.core.orchestrator().submit(id, "paper.pdf", path).unwrap();

        let (status, json) = send(&app.router, request("GET", &format!("/api/result/{id}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_STATE");

        let (status, json) = send(&app.router, request("POST", &format!("/api/analyze/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "processing");

        let (status, _) = send(&app.router, request("POST", &format!("/api/analyze/{id}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let final_status = wait_for_terminal(&app.router, &id.to_string()).await;
        assert_eq!(final_status["status"], "completed");
    }

    #[tokio::test]
    async fn unknown_tasks_are_not_found() {
        let app = working_app();
        let id = Uuid::new_v4();
        for (method, uri) in [
            ("GET", format!("/api/status/{id}")),
            ("GET", format!("/api/result/{id}")),
            ("POST", format!("/api/analyze/{id}")),
            ("DELETE", format!("/api/task/{id}")),
            ("GET", "/api/status/not-a-uuid".to_string()),
        ] {
            let (status, json) = send(&app.router, request(method, &uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(json["error"]["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn delete_removes_record_and_pending_source() {
        let app = working_app();
        let id = Uuid::new_v4();
        let path = app.dir.path().join("pending.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        app.core.orchestrator().submit(id, "pending.pdf", path.clone()).unwrap();

        let (status, json) = send(&app.router, request("DELETE", &format!("/api/task/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["task_id"], id.to_string());
        assert!(!path.exists());

        let (status, _) = send(&app.router, request("GET", &format!("/api/status/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        // Must not panic on a header-invalid origin.
        let _ = cors_layer(&["http://localhost:3000".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
