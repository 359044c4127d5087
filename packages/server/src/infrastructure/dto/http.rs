//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// One registered connection in the connections listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub connection_id: String,
    pub name: Option<String>,
    pub connected_at: String, // ISO 8601
}

/// Response body of `GET /api/connections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionListDto {
    pub count: usize,
    pub connections: Vec<ConnectionDto>,
}
