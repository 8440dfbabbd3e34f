//! HTTP request handlers
//!
//! Unary endpoints answer JSON; render endpoints hand back SSE streams
//! fed by a blocking render task. Render work and media probing run on
//! blocking threads so handler tasks never stall the runtime.

use super::server::AppContext;
use super::sse::sse_from_receiver;
use crate::service::{FileInfo, RenderFileParams, RenderWindowParams};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;
use waveforge_common::model::{Edl, TimeRange};

/// Events buffered per render stream before the renderer blocks
const RENDER_STREAM_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
pub struct UpdateEdlRequest {
    pub edl: Edl,
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateEdlResponse {
    pub edl_id: String,
    pub revision: String,
    pub track_count: usize,
    pub clip_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenderWindowRequest {
    pub edl_id: String,
    pub range: TimeRange,
    pub out_path: String,
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,
}

fn default_bit_depth() -> u32 {
    16
}

#[derive(Debug, Deserialize)]
pub struct LoadFileRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct LoadFileResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RenderFileRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub start_sec: Option<f64>,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    pub out_path: String,
}

/// Health check endpoint
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Status endpoint
pub async fn status(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let snapshot = ctx.service.snapshot();
    Json(json!({
        "service": "waveforge-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "time": chrono::Utc::now().to_rfc3339(),
        "uptime_ms": ctx.service.uptime_ms(),
        "edl": snapshot.map(|s| json!({
            "edl_id": s.edl.id,
            "revision": s.revision,
            "track_count": s.track_count,
            "clip_count": s.clip_count,
        })),
    }))
}

/// Validate and install a new EDL
pub async fn update_edl(
    State(ctx): State<AppContext>,
    Json(req): Json<UpdateEdlRequest>,
) -> Result<Json<UpdateEdlResponse>, (StatusCode, Json<serde_json::Value>)> {
    let service = ctx.service.clone();

    // Validation probes media files; keep it off the runtime threads
    let result = tokio::task::spawn_blocking(move || service.update_edl(req.edl, req.replace))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Task join error: {}", e) })),
            )
        })?;

    match result {
        Ok(snapshot) => Ok(Json(UpdateEdlResponse {
            edl_id: snapshot.edl.id.clone(),
            revision: snapshot.revision.clone(),
            track_count: snapshot.track_count,
            clip_count: snapshot.clip_count,
        })),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}

/// Render a window of the active EDL, streaming progress over SSE
pub async fn render_edl_window(
    State(ctx): State<AppContext>,
    Json(req): Json<RenderWindowRequest>,
) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel(RENDER_STREAM_BUFFER);
    let service = ctx.service.clone();
    let params = RenderWindowParams {
        edl_id: req.edl_id,
        range: req.range,
        out_path: PathBuf::from(req.out_path),
        bit_depth: req.bit_depth,
    };

    tokio::task::spawn_blocking(move || {
        if let Err(e) = service.render_edl_window(&params, &tx) {
            debug!("Render stream ended with error: {}", e);
        }
    });

    sse_from_receiver(rx)
}

/// Probe a media file and remember it as the loaded file
pub async fn load_file(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadFileRequest>,
) -> Json<LoadFileResponse> {
    let service = ctx.service.clone();
    let path = PathBuf::from(&req.path);

    let result = tokio::task::spawn_blocking(move || service.load_file(&path)).await;

    Json(match result {
        Ok(Ok(file_info)) => LoadFileResponse {
            success: true,
            message: "File loaded successfully".to_string(),
            file_info: Some(file_info),
        },
        Ok(Err(e)) => LoadFileResponse {
            success: false,
            message: e.to_string(),
            file_info: None,
        },
        Err(e) => LoadFileResponse {
            success: false,
            message: format!("Task join error: {}", e),
            file_info: None,
        },
    })
}

/// One-shot raw render of a file window, streaming progress over SSE
pub async fn render_file(
    State(ctx): State<AppContext>,
    Json(req): Json<RenderFileRequest>,
) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel(RENDER_STREAM_BUFFER);
    let service = ctx.service.clone();
    let params = RenderFileParams {
        path: req.path.map(PathBuf::from),
        start_sec: req.start_sec,
        duration_sec: req.duration_sec,
        out_path: PathBuf::from(req.out_path),
    };

    tokio::task::spawn_blocking(move || {
        if let Err(e) = service.render_file(&params, &tx) {
            debug!("File render stream ended with error: {}", e);
        }
    });

    sse_from_receiver(rx)
}
