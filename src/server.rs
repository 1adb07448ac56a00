//! HTTP front end.
//!
//! Two routes:
//!
//! * `POST /generate` with `{"text": "..."}` returns the PDF as an
//!   `application/pdf` attachment named `report.pdf`.
//! * Every GET, `/generate` included, is served from the pre-built frontend
//!   directory; paths that are not files get the index page, so client-side
//!   routes work.
//!
//! Error bodies are `{"detail": "..."}`. A generation failure always reads
//! `AI Generation Failed` (the cause is logged, not returned); a rendering
//! failure reads `PDF Failed: <cause>`.

use crate::config::{ReportConfig, ServerConfig};
use crate::error::ReportError;
use crate::generate::generate_report;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// File name offered to the browser for the generated PDF.
pub const DOWNLOAD_FILENAME: &str = "report.pdf";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ReportConfig>,
}

/// `POST /generate` body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP-level errors with status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Malformed body: {message}")]
    InvalidBody { status: StatusCode, message: String },
    #[error("AI Generation Failed")]
    GenerationFailed,
    #[error("PDF Failed: {0}")]
    RenderFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::EmptyInput => ApiError::BadRequest(e.to_string()),
            e if e.is_generation_failure() => {
                error!("Generation failed: {}", e);
                ApiError::GenerationFailed
            }
            e if e.is_render_failure() => {
                error!("Rendering failed: {}", e);
                ApiError::RenderFailed(e.to_string())
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::GenerationFailed | ApiError::RenderFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(detail) => {
                error!(detail, "API internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let detail = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidBody { message, .. } => message,
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Build the application router.
pub fn router(config: ReportConfig, server: &ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    let frontend =
        ServeDir::new(&server.static_dir).fallback(ServeFile::new(server.index_path()));

    // GET on /generate is a client-side route like any other path.
    Router::new()
        .route("/generate", post(generate).get_service(frontend.clone()))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::InvalidBody {
        status: e.status(),
        message: e.body_text(),
    })?;

    let output = generate_report(&body.text, &state.config).await?;
    info!(
        "Serving report {} ({} bytes)",
        output.id,
        output.pdf.len()
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""),
            ),
        ],
        output.pdf,
    )
        .into_response())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ReportConfig, server: ServerConfig) -> Result<(), ReportError> {
    if !server.static_dir.is_dir() {
        warn!(
            "Frontend directory {} not found; only POST /generate will be useful",
            server.static_dir.display()
        );
    }

    let app = router(config, &server);
    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .map_err(|e| ReportError::Internal(format!("Failed to bind {}: {e}", server.bind_addr)))?;
    info!("Listening on http://{}", server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ReportError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::{CompletionRequest, TextGenerator};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Canned(Result<&'static str, &'static str>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ReportError> {
            self.0
                .map(str::to_string)
                .map_err(|m| ReportError::BackendError {
                    message: m.to_string(),
                })
        }
    }

    fn app(tmp: &TempDir, reply: Result<&'static str, &'static str>) -> Router {
        let config = ReportConfig::builder()
            .generator(Arc::new(Canned(reply)))
            .output_dir(tmp.path().join("output"))
            .build()
            .unwrap();
        let server = ServerConfig {
            static_dir: tmp.path().join("client"),
            ..ServerConfig::default()
        };
        router(config, &server)
    }

    fn post_generate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn detail(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        v["detail"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn generate_returns_pdf_attachment() {
        let tmp = TempDir::new().unwrap();
        let app = app(
            &tmp,
            Ok(r#"{"meta": {"title": "T"}, "sections": [{"heading": "H", "content": "C"}]}"#),
        );
        let response = app
            .oneshot(post_generate(r#"{"text": "Marketing plan"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn backend_failure_is_generic_500() {
        let tmp = TempDir::new().unwrap();
        let response = app(&tmp, Err("HTTP 401 invalid key"))
            .oneshot(post_generate(r#"{"text": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail(response).await, "AI Generation Failed");
    }

    #[tokio::test]
    async fn unparseable_reply_is_generation_failure() {
        let tmp = TempDir::new().unwrap();
        let response = app(&tmp, Ok("Sorry, I cannot do that."))
            .oneshot(post_generate(r#"{"text": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail(response).await, "AI Generation Failed");
    }

    #[tokio::test]
    async fn empty_text_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let response = app(&tmp, Ok("{}"))
            .oneshot(post_generate(r#"{"text": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_text_field_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let response = app(&tmp, Ok("{}"))
            .oneshot(post_generate(r#"{"body": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!detail(response).await.is_empty());
    }

    #[test]
    fn render_errors_carry_cause() {
        let api: ApiError = ReportError::MissingInput {
            path: PathBuf::from("output/content.json"),
        }
        .into();
        let msg = api.to_string();
        assert!(msg.starts_with("PDF Failed: "), "{msg}");
        assert!(msg.contains("output/content.json"));
    }

    #[tokio::test]
    async fn spa_serves_files_and_falls_back_to_index() {
        let tmp = TempDir::new().unwrap();
        let client = tmp.path().join("client");
        std::fs::create_dir_all(&client).unwrap();
        std::fs::write(client.join("index.html"), "<html>app</html>").unwrap();
        std::fs::write(client.join("main.js"), "console.log(1)").unwrap();

        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = app(&tmp, Ok("{}")).oneshot(get("/main.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"console.log(1)");

        for path in ["/reports/42", "/generate"] {
            let response = app(&tmp, Ok("{}")).oneshot(get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {path}");
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"<html>app</html>", "GET {path}");
        }
    }
}
