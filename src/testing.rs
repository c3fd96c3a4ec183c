//! Test doubles for the outbound seams.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::conversation::ChatMessage;
use crate::llm::{Completion, CompletionError, CompletionProvider};
use crate::telegram::{Messenger, MessengerError};

/// One recorded outbound Telegram call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Photo { chat_id: i64, url: String, caption: String },
    ContactRequest { chat_id: i64, text: String, button: String },
    Plain { chat_id: i64, text: String },
}

/// Messenger that records calls instead of hitting the Bot API
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingMessenger {
    /// Messenger whose every call fails (nothing is recorded)
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, sent: Sent) -> Result<(), MessengerError> {
        if self.fail {
            return Err(MessengerError::InvalidUrl("test failure".to_string()));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), MessengerError> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        })
    }

    async fn send_photo(&self, chat_id: i64, image_url: &str, caption: &str) -> Result<(), MessengerError> {
        self.record(Sent::Photo {
            chat_id,
            url: image_url.to_string(),
            caption: caption.to_string(),
        })
    }

    async fn send_contact_request(&self, chat_id: i64, text: &str, button: &str) -> Result<(), MessengerError> {
        self.record(Sent::ContactRequest {
            chat_id,
            text: text.to_string(),
            button: button.to_string(),
        })
    }

    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<(), MessengerError> {
        self.record(Sent::Plain {
            chat_id,
            text: text.to_string(),
        })
    }
}

/// Completion provider that replays scripted replies and records requests
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, (u16, String)>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn reply(self, content: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(content.to_string()));
        self
    }

    pub fn fail(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err((status, body.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(Completion::text(content)),
            Some(Err((status, body))) => Err(CompletionError::Api { status, body }),
            None => Err(CompletionError::EmptyResponse),
        }
    }
}
