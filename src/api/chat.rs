//! Chat relay endpoint
//!
//! One request = one user turn: the message is appended to the session,
//! the whole transcript goes to the model, and the reply is stored, relayed
//! to the linked Telegram chat (reply first, then each booking link) and
//! returned to the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::conversation::Role;
use crate::links::extract_links;
use crate::llm::CompletionError;
use crate::prompt::system_prompt;
use crate::telegram::{Notifier, NotifyOutcome};

/// User-facing text returned when the model call fails
pub const CHAT_ERROR_MESSAGE: &str = "❌ An error occurred while processing your request.";

fn default_lang() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    pub session_id: Uuid,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: Uuid,
}

/// Model failure, reported with the session it happened in
#[derive(Error, Debug)]
#[error("chat completion failed for session {session_id}: {source}")]
pub struct ChatError {
    pub session_id: Uuid,
    #[source]
    pub source: CompletionError,
}

#[derive(Debug, Serialize)]
struct ChatErrorBody {
    response: &'static str,
    error: String,
    session_id: Uuid,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self.source {
            CompletionError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = ChatErrorBody {
            response: CHAT_ERROR_MESSAGE,
            error: self.source.to_string(),
            session_id: self.session_id,
        };
        (status, Json(body)).into_response()
    }
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    let session_id = request.session_id;

    let today = state.today();
    let transcript = state
        .sessions
        .push_user_turn(
            session_id,
            || system_prompt(today, &request.lang),
            request.message.as_str(),
        )
        .await;

    debug!("Session {}: sending {} messages to model", session_id, transcript.len());

    // The user turn stays in the transcript even if the model call fails
    let reply = match state.completion.complete(&transcript).await {
        Ok(completion) => completion.content,
        Err(source) => {
            warn!("Chat completion failed for session {}: {}", session_id, source);
            return Err(ChatError { session_id, source });
        }
    };

    state
        .sessions
        .append(session_id, Role::Assistant, reply.as_str())
        .await;

    match request.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(phone) => relay_reply(&state.notifier, phone, &reply).await,
        None => debug!("No phone on request, skipping Telegram relay"),
    }

    Ok(Json(ChatResponse {
        response: reply,
        session_id,
    }))
}

/// Send the reply, then each extracted link as its own message.
///
/// Links are skipped when the reply itself could not be routed.
async fn relay_reply(notifier: &Notifier, phone: &str, reply: &str) {
    match notifier.notify(phone, reply, None).await {
        NotifyOutcome::NotLinked | NotifyOutcome::Disabled => return,
        NotifyOutcome::Sent | NotifyOutcome::Failed => {}
    }

    let links = extract_links(reply);
    info!("Relaying {} booking links", links.len());
    for link in links {
        notifier.notify(phone, &link.to_string(), None).await;
    }
}
