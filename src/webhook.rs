//! Telegram webhook parsing
//!
//! Classifies inbound Bot API updates into the two events the linking flow
//! reacts to. Anything else, including bodies that are not updates at all,
//! is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Telegram update payload (only the fields the linking flow reads)
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

/// Telegram message payload
#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub contact: Option<TelegramContact>,
}

/// Telegram chat metadata
#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Message sender
#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

/// Shared contact card
#[derive(Debug, Deserialize)]
pub struct TelegramContact {
    pub phone_number: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Event the webhook reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `/start` command
    Start { chat_id: i64 },
    /// Contact shared through the reply keyboard
    Contact { chat_id: i64, phone: String },
    Ignored,
}

/// Status returned to the Bot API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    StartSent,
    Linked,
    Ignored,
}

/// Whether `text` is the `/start` command, with or without a deep-link
/// payload or a `@botname` suffix
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    command == "/start"
}

/// Classify a parsed update.
///
/// A contact card that names a Telegram user other than the sender is
/// ignored, so only the keyboard's own-number share links a phone.
pub fn classify(update: &TelegramUpdate) -> WebhookEvent {
    let Some(message) = &update.message else {
        return WebhookEvent::Ignored;
    };
    let chat_id = message.chat.id;

    if message.text.as_deref().is_some_and(is_start_command) {
        return WebhookEvent::Start { chat_id };
    }

    if let Some(contact) = &message.contact {
        if let (Some(owner), Some(sender)) = (contact.user_id, message.from.as_ref()) {
            if owner != sender.id {
                debug!("Ignoring contact of user {} shared by {}", owner, sender.id);
                return WebhookEvent::Ignored;
            }
        }
        return WebhookEvent::Contact {
            chat_id,
            phone: contact.phone_number.clone(),
        };
    }

    WebhookEvent::Ignored
}

/// Classify a raw JSON body; bodies that are not updates are ignored
pub fn classify_value(body: Value) -> WebhookEvent {
    match serde_json::from_value::<TelegramUpdate>(body) {
        Ok(update) => classify(&update),
        Err(e) => {
            debug!("Ignoring non-update webhook body: {}", e);
            WebhookEvent::Ignored
        }
    }
}
