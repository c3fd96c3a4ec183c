//! Health Check API
//!
//! Liveness message at `/` plus health endpoints for monitoring.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::AppState;

/// Root liveness message
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the ChatBot API" }))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status
    pub status: &'static str,
    /// Application version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Live chat sessions
    pub sessions: usize,
    /// Messages across all sessions
    pub messages: usize,
    /// Linked phones, `None` if the directory file is unreadable
    pub linked_phones: Option<usize>,
    /// Whether Telegram delivery is configured
    pub telegram_enabled: bool,
    /// Timestamp (ISO 8601)
    pub timestamp: String,
}

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.stats().await;
    let linked_phones = match state.directory.stats().await {
        Ok(stats) => Some(stats.linked_phones),
        Err(e) => {
            warn!("Health check could not read phone directory: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if linked_phones.is_some() { "ok" } else { "degraded" },
        version: state.version,
        uptime_secs: state.uptime_secs(),
        sessions: sessions.sessions,
        messages: sessions.messages,
        linked_phones,
        telegram_enabled: state.notifier.is_enabled(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Liveness probe (minimal response)
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
