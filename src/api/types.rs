//! API request and response types.

use serde::{Deserialize, Serialize};

/// Query string of `GET /agent/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentQuery {
    /// The user's question
    pub message: String,

    /// Session token from a previous response; omitted to start a new session
    pub session: Option<String>,
}

/// Answer to an agent query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentResponse {
    pub response: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
