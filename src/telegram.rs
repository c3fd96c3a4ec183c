//! Telegram delivery
//!
//! Outbound side of the bot: relays chat replies and booking links to the
//! Telegram chat linked to a phone number, and answers the `/start` +
//! contact-share linking flow.
//!
//! Delivery is best effort. Unlinked phones and Bot API failures are logged
//! and never surfaced to the HTTP caller.

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{ButtonRequest, InputFile, KeyboardButton, KeyboardMarkup, ParseMode},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::directory::{normalize_phone, PhoneDirectory};

/// Reply to `/start`
pub const WELCOME_MESSAGE: &str = "👋 Welcome to the Vacation Assistant!\n\n\
    Please tap the button below to share your phone number. Once you do, \
    you’ll receive vacation suggestions via this chat whenever you search on our website.";

/// Label of the contact-request keyboard button
pub const SHARE_PHONE_BUTTON: &str = "📱 Share Phone Number";

/// Reply to a shared contact
pub const LINKED_MESSAGE: &str = "✅ You’re now linked! You’ll receive hotel links here when you use the assistant on the website.";

/// Messenger errors
#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("Invalid image URL {0:?}")]
    InvalidUrl(String),
}

/// Low-level message sending, one implementation per bot backend
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a Markdown text message
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), MessengerError>;

    /// Send an image by URL with a Markdown caption
    async fn send_photo(&self, chat_id: i64, image_url: &str, caption: &str) -> Result<(), MessengerError>;

    /// Send plain text with a one-time "share contact" reply keyboard
    async fn send_contact_request(&self, chat_id: i64, text: &str, button: &str) -> Result<(), MessengerError>;

    /// Send plain text without parse mode
    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<(), MessengerError>;
}

/// Bot API messenger backed by teloxide
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

// Replies carry unescaped model output, so the legacy Markdown mode is used
#[allow(deprecated)]
#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), MessengerError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown)
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, image_url: &str, caption: &str) -> Result<(), MessengerError> {
        let url: reqwest::Url = image_url
            .parse()
            .map_err(|_| MessengerError::InvalidUrl(image_url.to_string()))?;

        self.bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Markdown)
            .await?;
        Ok(())
    }

    async fn send_contact_request(&self, chat_id: i64, text: &str, button: &str) -> Result<(), MessengerError> {
        let keyboard = KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(button).request(ButtonRequest::Contact),
        ]])
        .resize_keyboard()
        .one_time_keyboard();

        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<(), MessengerError> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

/// Result of a phone-addressed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No chat linked to the phone
    NotLinked,
    /// No bot token configured
    Disabled,
    /// Lookup or delivery failed (already logged)
    Failed,
}

/// Phone-addressed notifier
#[derive(Clone)]
pub struct Notifier {
    directory: Arc<PhoneDirectory>,
    messenger: Option<Arc<dyn Messenger>>,
}

impl Notifier {
    pub fn new(directory: Arc<PhoneDirectory>, messenger: Option<Arc<dyn Messenger>>) -> Self {
        if messenger.is_none() {
            warn!("TELEGRAM_BOT_TOKEN not set - Telegram delivery disabled");
        }
        Self {
            directory,
            messenger,
        }
    }

    /// Create from an optional bot token
    pub fn from_token(directory: Arc<PhoneDirectory>, token: Option<&str>) -> Self {
        let messenger = token.map(|t| Arc::new(TelegramMessenger::new(t)) as Arc<dyn Messenger>);
        Self::new(directory, messenger)
    }

    pub fn is_enabled(&self) -> bool {
        self.messenger.is_some()
    }

    pub fn directory(&self) -> &Arc<PhoneDirectory> {
        &self.directory
    }

    /// Deliver `text` (optionally as an image caption) to the chat linked
    /// to `phone`.
    pub async fn notify(&self, phone: &str, text: &str, image_url: Option<&str>) -> NotifyOutcome {
        let phone = normalize_phone(phone);
        debug!("Looking up chat_id for phone: {}", phone);

        let Some(messenger) = &self.messenger else {
            debug!("Telegram disabled, dropping message for {}", phone);
            return NotifyOutcome::Disabled;
        };

        let chat_id = match self.directory.resolve(&phone).await {
            Ok(Some(chat_id)) => chat_id,
            Ok(None) => {
                warn!("Chat ID not found for phone: {}", phone);
                return NotifyOutcome::NotLinked;
            }
            Err(e) => {
                error!("Phone lookup failed for {}: {}", phone, e);
                return NotifyOutcome::Failed;
            }
        };

        let result = match image_url {
            Some(url) => {
                info!("Sending image to chat_id {}: {}", chat_id, url);
                messenger.send_photo(chat_id, url, text).await
            }
            None => {
                info!("Sending message to chat_id {} ({} bytes)", chat_id, text.len());
                messenger.send_text(chat_id, text).await
            }
        };

        match result {
            Ok(()) => NotifyOutcome::Sent,
            Err(e) => {
                error!("Failed to send to chat_id {}: {}", chat_id, e);
                NotifyOutcome::Failed
            }
        }
    }

    /// Answer `/start` with the share-contact keyboard
    pub async fn send_welcome(&self, chat_id: i64) {
        let Some(messenger) = &self.messenger else {
            return;
        };
        if let Err(e) = messenger
            .send_contact_request(chat_id, WELCOME_MESSAGE, SHARE_PHONE_BUTTON)
            .await
        {
            error!("Failed to send welcome to chat_id {}: {}", chat_id, e);
        }
    }

    /// Confirm a successful phone link
    pub async fn send_link_confirmation(&self, chat_id: i64) {
        let Some(messenger) = &self.messenger else {
            return;
        };
        if let Err(e) = messenger.send_plain(chat_id, LINKED_MESSAGE).await {
            error!("Failed to send link confirmation to chat_id {}: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingMessenger, Sent};
    use tempfile::tempdir;

    fn notifier(dir: &std::path::Path, messenger: Arc<RecordingMessenger>) -> Notifier {
        let directory = Arc::new(PhoneDirectory::open(dir.join("links.json")));
        Notifier::new(directory, Some(messenger as Arc<dyn Messenger>))
    }

    #[tokio::test]
    async fn test_notify_unlinked_phone_is_noop() {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = notifier(dir.path(), messenger.clone());

        let outcome = notifier.notify("+201001234567", "hello", None).await;
        assert_eq!(outcome, NotifyOutcome::NotLinked);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notify_linked_phone_sends_text() {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = notifier(dir.path(), messenger.clone());
        notifier.directory().link("201001234567", 77).await.unwrap();

        let outcome = notifier.notify("+201001234567", "hello", None).await;
        assert_eq!(outcome, NotifyOutcome::Sent);
        assert_eq!(messenger.sent(), vec![Sent::Text { chat_id: 77, text: "hello".into() }]);
    }

    #[tokio::test]
    async fn test_notify_with_image_sends_photo() {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = notifier(dir.path(), messenger.clone());
        notifier.directory().link("1", 5).await.unwrap();

        notifier.notify("1", "caption", Some("https://img.example/a.jpg")).await;
        assert_eq!(
            messenger.sent(),
            vec![Sent::Photo {
                chat_id: 5,
                url: "https://img.example/a.jpg".into(),
                caption: "caption".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::failing());
        let notifier = notifier(dir.path(), messenger.clone());
        notifier.directory().link("1", 5).await.unwrap();

        assert_eq!(notifier.notify("1", "x", None).await, NotifyOutcome::Failed);
        notifier.send_welcome(5).await;
        notifier.send_link_confirmation(5).await;
    }

    #[tokio::test]
    async fn test_disabled_notifier() {
        let dir = tempdir().unwrap();
        let directory = Arc::new(PhoneDirectory::open(dir.path().join("links.json")));
        let notifier = Notifier::new(directory, None);

        assert!(!notifier.is_enabled());
        assert_eq!(notifier.notify("1", "x", None).await, NotifyOutcome::Disabled);
    }

    #[tokio::test]
    async fn test_welcome_uses_contact_keyboard() {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = notifier(dir.path(), messenger.clone());

        notifier.send_welcome(9).await;
        notifier.send_link_confirmation(9).await;

        assert_eq!(
            messenger.sent(),
            vec![
                Sent::ContactRequest {
                    chat_id: 9,
                    text: WELCOME_MESSAGE.into(),
                    button: SHARE_PHONE_BUTTON.into()
                },
                Sent::Plain { chat_id: 9, text: LINKED_MESSAGE.into() },
            ]
        );
    }

    #[test]
    fn test_keyboard_serializes_contact_request() {
        let keyboard = KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(SHARE_PHONE_BUTTON).request(ButtonRequest::Contact),
        ]])
        .resize_keyboard()
        .one_time_keyboard();

        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(json["keyboard"][0][0]["request_contact"], true);
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["one_time_keyboard"], true);
    }
}
