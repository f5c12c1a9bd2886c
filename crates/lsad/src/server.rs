//! HTTP transport for the recovery pipeline
//!
//! Endpoints:
//!   POST /api/decrypt  - multipart upload (field `file`), streams back the recovered media
//!   GET  /             - banner
//!   GET  /healthz      - liveness probe
//!   GET  /metrics      - Prometheus text format

use anyhow::Result;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use lsa_core::config::ServerConfig;
use lsa_core::{ContainerKind, RecoveredArtifact, RecoveryError, Stage};
use lsa_recovery::Recoverer;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::metrics::{metrics_handler, RecoveryMetrics};

/// Carries the bare output filename so browser clients need not parse
/// `Content-Disposition`.
pub const X_FILENAME: HeaderName = HeaderName::from_static("x-filename");

/// Multipart framing allowance on top of the container size limit
const MULTIPART_SLACK: usize = 64 * 1024;

/// Metrics label for uploads rejected before the filename could be read
const KIND_UNKNOWN: &str = "unknown";

const OVERSIZE_REASON: &str = "container exceeds upload limit";

#[derive(Clone)]
pub struct AppState {
    pub recoverer: Recoverer,
    pub metrics: RecoveryMetrics,
    pub registry: Arc<Registry>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] RecoveryError),

    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    BadRequest(&'static str),
}

impl ApiError {
    /// True for both the explicit size check and the transport body limit.
    fn is_oversize(&self) -> bool {
        match self {
            ApiError::Rejected(RecoveryError::OversizeInput { .. }) => true,
            ApiError::Multipart(e) => e.status() == StatusCode::PAYLOAD_TOO_LARGE,
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Rejected(e) => {
                let status = match e {
                    RecoveryError::OversizeInput { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (
                    status,
                    serde_json::json!({
                        "error": e.reason(),
                        "detail": e.to_string(),
                        "stage": e.stage(),
                    }),
                )
            }
            // Body limit tripped inside the multipart stream
            ApiError::Multipart(e) if self.is_oversize() => (
                StatusCode::PAYLOAD_TOO_LARGE,
                serde_json::json!({
                    "error": OVERSIZE_REASON,
                    "detail": e.body_text(),
                    "stage": Stage::Received,
                }),
            ),
            ApiError::Multipart(e) => (e.status(), serde_json::json!({ "error": e.body_text() })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_SLACK);

    Router::new()
        .route("/", get(home_handler))
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/decrypt", post(decrypt_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Serve on `addr` until Ctrl-C / SIGTERM.
pub async fn serve(addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {addr}: {e}"))?;

    info!(
        addr = %addr,
        "listening on /api/decrypt, /healthz, /metrics"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("http server: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler failed: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler failed: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION, X_FILENAME])
}

async fn home_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "lsa recovery service running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

struct Upload {
    filename: String,
    /// Empty once `size` passes the limit
    bytes: Vec<u8>,
    /// Bytes seen in the `file` field, including any past the limit
    size: usize,
}

async fn decrypt_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let upload = match read_upload(&mut multipart, state.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            if e.is_oversize() {
                let secs = started.elapsed().as_secs_f64();
                state.metrics.observe(KIND_UNKNOWN, OVERSIZE_REASON, 0, secs);
            }
            return Err(e);
        }
    };
    let kind = ContainerKind::from_filename(&upload.filename)
        .map(ContainerKind::as_str)
        .unwrap_or("unsupported");
    let len = upload.size;

    let result = admit(&upload, state.max_upload_bytes)
        .and_then(|()| state.recoverer.recover(&upload.filename, upload.bytes));

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.reason(),
    };
    state
        .metrics
        .observe(kind, outcome, len, started.elapsed().as_secs_f64());

    Ok(artifact_response(result?))
}

/// Transport-side checks that run before the pipeline sees any bytes.
fn admit(upload: &Upload, limit: usize) -> Result<(), RecoveryError> {
    ContainerKind::from_filename(&upload.filename)?;
    if upload.size > limit {
        return Err(RecoveryError::OversizeInput {
            size: upload.size,
            limit,
        });
    }
    Ok(())
}

/// Read the `file` field, buffering at most `limit` bytes of it.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<Upload, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or(ApiError::BadRequest("upload field `file` has no filename"))?;

        let mut bytes = Vec::new();
        let mut size = 0usize;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    size = size.saturating_add(chunk.len());
                    if size <= limit {
                        bytes.extend_from_slice(&chunk);
                    } else {
                        bytes = Vec::new();
                    }
                }
                Ok(None) => break,
                Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    size = size.max(limit.saturating_add(1));
                    bytes = Vec::new();
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        return Ok(Upload {
            filename,
            bytes,
            size,
        });
    }
    Err(ApiError::BadRequest("missing multipart field `file`"))
}

fn artifact_response(artifact: RecoveredArtifact) -> Response {
    let name = header_safe(&artifact.filename);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        name.replace(['"', '\\'], "_")
    );

    let mut response = Response::new(Body::from(artifact.bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.format.mime),
    );
    // `header_safe` leaves only visible ASCII and spaces, which are always valid
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    if let Ok(v) = HeaderValue::from_str(&name) {
        headers.insert(X_FILENAME, v);
    }
    response
}

/// Replace anything that cannot appear in a header value.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || c.is_ascii_graphic() {
                c
            } else {
                '_'
            }
        })
        .collect()
}
