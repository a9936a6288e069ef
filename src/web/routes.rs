//! Route table for the HTTP surface

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::viewer))
        .route("/index.html", get(handlers::viewer))
        .route("/frame", get(handlers::frame))
        .route("/setFilter", get(handlers::set_filter))
        .route("/api/setFilter", get(handlers::set_filter))
        .route("/api/capture", get(handlers::capture))
        .route("/api/switchCamera", get(handlers::switch_camera))
        .route("/api/status", get(handlers::status))
        .route("/api/gallery", get(handlers::gallery))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
