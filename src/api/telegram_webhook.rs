//! Telegram webhook endpoint
//!
//! `/start` gets the share-contact keyboard; a shared contact links the
//! phone to the chat it came from. Sending the bot replies is best effort,
//! persisting the link is not.

use axum::{extract::State, response::Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::webhook::{classify_value, WebhookEvent, WebhookStatus};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: WebhookStatus,
}

pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let status = match classify_value(body) {
        WebhookEvent::Start { chat_id } => {
            info!("/start from chat_id {}", chat_id);
            state.notifier.send_welcome(chat_id).await;
            WebhookStatus::StartSent
        }
        WebhookEvent::Contact { chat_id, phone } => {
            let key = state.directory.link(&phone, chat_id).await?;
            info!("Linked phone {} -> chat_id {}", key, chat_id);
            state.notifier.send_link_confirmation(chat_id).await;
            WebhookStatus::Linked
        }
        WebhookEvent::Ignored => {
            debug!("Ignoring webhook update");
            WebhookStatus::Ignored
        }
    };

    Ok(Json(WebhookResponse { status }))
}
