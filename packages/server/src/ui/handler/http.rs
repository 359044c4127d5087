//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use relay_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::http::{ConnectionDto, ConnectionListDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing the currently registered connections
pub async fn list_connections(State(state): State<Arc<AppState>>) -> Json<ConnectionListDto> {
    let connections: Vec<ConnectionDto> = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|entry| ConnectionDto {
            connection_id: entry.id().to_string(),
            name: entry.name.map(|name| name.into_string()),
            connected_at: timestamp_to_jst_rfc3339(entry.connected_at.value()),
        })
        .collect();

    Json(ConnectionListDto {
        count: connections.len(),
        connections,
    })
}
