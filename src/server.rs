use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, JsonRejection},
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::error::TriageError;
use crate::media::{self, VideoSource, MAX_VIDEO_BYTES};
use crate::pipeline::Analyzer;
use crate::relay::{alert_message, sms_gateway_address, Carrier, RelayClient};
use crate::session::{SessionSnapshot, SharedSession};

/// Uploads a little over the video limit still reach the validator
const UPLOAD_BODY_LIMIT: usize = (MAX_VIDEO_BYTES as usize) + 1024 * 1024;

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub analyzer: Arc<Analyzer>,
    pub relay: Option<Arc<RelayClient>>,
    pub upload_dir: PathBuf,
}

/// JSON error reply: `{success: false, error}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        let status = match &err {
            TriageError::Validation(_) | TriageError::NoVideoSelected => StatusCode::BAD_REQUEST,
            TriageError::AnalysisInFlight => StatusCode::CONFLICT,
            TriageError::Relay(_) => StatusCode::BAD_GATEWAY,
            TriageError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            TriageError::Encoding(_)
            | TriageError::Inference(_)
            | TriageError::ResponseFormat(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("Request failed ({}): {}", self.status, self.message);
        }
        (
            self.status,
            Json(json!({"success": false, "error": self.message})),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub to: String,
    pub carrier: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/video", post(upload_video))
        .route("/api/analyze", post(start_analysis))
        .route("/api/alert/ack", post(acknowledge_alert))
        .route("/api/alert/notify", post(notify_alert))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&state.upload_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("Serving incident triage API on http://{}", addr);
    log::info!("Uploads stored in {:?}", state.upload_dir);
    match &state.relay {
        Some(relay) => log::info!("Alerts can be forwarded via {}", relay.url()),
        None => log::info!("No notification relay configured"),
    }

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

async fn upload_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .ok_or_else(|| TriageError::Validation("missing Content-Type header".to_string()))?;

    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(len) = declared_len {
        media::validate(&mime_type, len)?;
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(TriageError::Validation(format!(
                "file exceeds the {} MiB limit",
                MAX_VIDEO_BYTES / (1024 * 1024)
            ))
            .into());
        }
        Err(rejection) => return Err(ApiError::new(rejection.status(), rejection.body_text())),
    };
    let source_len = body.len() as u64;

    let file_name = format!(
        "{}-{}.{}",
        Utc::now().format("%Y%m%dT%H%M%S%.3f"),
        UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed),
        media::extension_for(&mime_type)
    );
    // Validates type and size before anything touches the disk
    let source = VideoSource::new(state.upload_dir.join(file_name), &mime_type, source_len)?;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    tokio::fs::write(&source.path, &body)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    log::info!("Selected upload {} ({} bytes)", source.file_name(), source.size_bytes);

    let (replaced, snapshot) = {
        let mut session = state.session.lock().await;
        let replaced = session.select_video(source);
        (replaced, session.snapshot())
    };

    if let Some(previous) = replaced {
        remove_upload(&state, &previous).await;
    }
    Ok(Json(snapshot))
}

/// Delete a replaced upload; sources outside the upload directory are left alone
async fn remove_upload(state: &AppState, source: &VideoSource) {
    if !source.path.starts_with(&state.upload_dir) {
        return;
    }
    match tokio::fs::remove_file(&source.path).await {
        Ok(()) => log::debug!("Removed replaced upload {}", source.file_name()),
        Err(e) => log::warn!("Failed to remove upload {:?}: {}", source.path, e),
    }
}

async fn start_analysis(State(state): State<AppState>) -> Result<Response, ApiError> {
    let ticket = state.session.lock().await.begin_analysis()?;
    let generation = ticket.generation;

    let analyzer = state.analyzer.clone();
    let session = state.session.clone();
    tokio::spawn(async move {
        analyzer.finish(&session, ticket).await;
    });

    Ok((StatusCode::ACCEPTED, Json(json!({"generation": generation}))).into_response())
}

async fn acknowledge_alert(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    if !session.acknowledge_alert() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "no active alert"));
    }
    Ok(Json(session.snapshot()))
}

async fn notify_alert(
    State(state): State<AppState>,
    request: Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) =
        request.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;

    let relay = state.relay.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "no notification relay configured",
        )
    })?;

    let incident = state
        .session
        .lock()
        .await
        .active_alert()
        .map(|alert| alert.incident.clone())
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no active alert"))?;

    let to = match request.carrier.as_deref() {
        Some(carrier) => {
            let carrier: Carrier = carrier
                .parse()
                .map_err(|e: TriageError| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
            sms_gateway_address(&request.to, carrier)
                .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?
        }
        None => request.to,
    };

    let receipt = relay.send(&alert_message(&to, &incident)).await?;
    Ok(Json(receipt).into_response())
}
