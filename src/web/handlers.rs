//! HTTP request handlers

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::state::{AppState, StatusResponse};
use crate::video::filter::FilterMode;

/// Viewer page
pub async fn viewer() -> Html<&'static str> {
    Html(include_str!("viewer.html"))
}

/// Latest frame as JPEG. Plain-text 404 until the pipeline has
/// published at least one frame.
pub async fn frame(State(state): State<Arc<AppState>>) -> Result<Response> {
    let frame = match state.stream_mailbox.latest() {
        Some(frame) => frame,
        None => {
            return Ok((StatusCode::NOT_FOUND, "No frame available").into_response());
        }
    };

    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for px in frame.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, state.jpeg_quality);
    encoder.encode(
        &rgb,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;

    state.record_served_frame();
    debug!(
        sequence = frame.sequence,
        bytes = jpeg.len(),
        "Served frame"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        jpeg,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct FilterQuery {
    pub mode: Option<String>,
}

/// Change the active filter. The request string is normalized, so
/// `gray`, `GRAYSCALE` and garbage all resolve to a concrete mode.
/// The host callback's verdict is reported but never blocks the change.
pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Json<Value> {
    let requested = query.mode.unwrap_or_default();
    let mode = FilterMode::normalize(&requested);
    let accepted = state.host.filter_changed(mode);
    state.filter.set(mode);

    info!(requested, mode = mode.as_str(), accepted, "Filter changed");
    Json(json!({ "mode": mode.as_str(), "accepted": accepted }))
}

/// Ask the host to capture a photo.
pub async fn capture(State(state): State<Arc<AppState>>) -> Json<Value> {
    let accepted = state.host.capture();
    info!(accepted, "Capture requested");
    Json(json!({ "started": accepted }))
}

/// Ask the host to switch between front and back cameras.
pub async fn switch_camera(State(state): State<Arc<AppState>>) -> Json<Value> {
    let accepted = state.host.switch_camera();
    info!(accepted, "Camera switch requested");
    Json(json!({ "switched": accepted }))
}

/// Pipeline and serving statistics.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.status())
}

/// Names of photos the host has captured, newest first, as a bare
/// JSON array.
pub async fn gallery(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.host.gallery())
}
