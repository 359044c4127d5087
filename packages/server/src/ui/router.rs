//! HTTP router.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::ui::{
    handler::{health_check, list_connections, websocket_handler},
    state::AppState,
};

/// Build the application router.
///
/// The WebSocket endpoint is mounted on every path in `websocket_paths`.
pub fn build_router(state: Arc<AppState>, websocket_paths: &[String]) -> Router {
    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/connections", get(list_connections));

    websocket_paths
        .iter()
        .fold(router, |router, path| router.route(path, get(websocket_handler)))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
