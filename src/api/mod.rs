//! HTTP API
//!
//! Routes:
//! - GET  /                  - Liveness message
//! - GET  /health            - Health with uptime and store sizes
//! - GET  /healthz           - Liveness probe
//! - POST /chat              - Chat relay
//! - POST /telegram-webhook  - Bot API updates (`/start`, contact share)
//! - POST /check-phone       - Whether a phone has a linked chat

pub mod chat;
pub mod health;
pub mod phone;
pub mod telegram_webhook;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::Config;
use crate::conversation::SessionStore;
use crate::directory::{DirectoryError, PhoneDirectory};
use crate::llm::{CompletionProvider, OpenAiClient};
use crate::telegram::Notifier;

pub use chat::{chat_handler, ChatError, ChatRequest, ChatResponse, CHAT_ERROR_MESSAGE};
pub use health::{health_check, liveness, root, HealthResponse};
pub use phone::{check_phone, CheckPhoneRequest, CheckPhoneResponse};
pub use telegram_webhook::{telegram_webhook, WebhookResponse};

/// Application state shared across handlers
pub struct AppState {
    /// Per-session transcripts
    pub sessions: SessionStore,
    /// Phone -> chat id links
    pub directory: Arc<PhoneDirectory>,
    /// Model backend
    pub completion: Arc<dyn CompletionProvider>,
    /// Telegram delivery
    pub notifier: Notifier,
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Application version
    pub version: &'static str,
    today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(
        directory: Arc<PhoneDirectory>,
        completion: Arc<dyn CompletionProvider>,
        notifier: Notifier,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            directory,
            completion,
            notifier,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
            today: || chrono::Local::now().date_naive(),
        }
    }

    /// Wire the real backends from config
    pub fn from_config(config: &Config) -> Self {
        let directory = Arc::new(PhoneDirectory::open(&config.directory_path));
        let completion = Arc::new(OpenAiClient::from_config(config));
        if !completion.is_available() {
            warn!("OPENAI_API_KEY not set - /chat will return errors");
        }
        let notifier = Notifier::from_token(directory.clone(), config.telegram_bot_token.as_deref());
        Self::new(directory, completion, notifier)
    }

    /// Pin the date used in system prompts
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Errors surfaced by the non-chat endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Directory(DirectoryError::InvalidPhone(_)) => StatusCode::BAD_REQUEST,
            ApiError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", self);
        (status, Json(json!({ "status": "error", "error": self.to_string() }))).into_response()
    }
}

/// Create the API router
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/chat", post(chat_handler))
        .route("/telegram-webhook", post(telegram_webhook))
        .route("/check-phone", post(check_phone))
        .with_state(state)
}
