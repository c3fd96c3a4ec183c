//! StayBot Chat Relay
//!
//! HTTP chat service for vacation-stay questions. Messages go to an
//! OpenAI-compatible model with a per-session transcript; replies and the
//! booking links in them are relayed to the Telegram chat linked to the
//! user's phone number.
//!
//! # Features
//!
//! - **Chat relay**: `POST /chat` with in-memory session transcripts
//! - **Phone linking**: Telegram `/start` + contact share via webhook
//! - **Link extraction**: Markdown and bare Airbnb URLs from replies
//!
//! # Architecture
//!
//! ```text
//! Web client ──► POST /chat ──► SessionStore ──► Chat Completions API
//!                                   │
//!                                   └── reply ──► Link Extractor
//!                                                      │
//!                     PhoneDirectory ◄── Notifier ◄────┘
//!                   (chat_id_store.json)    │
//!                                           ▼
//! Telegram ──► POST /telegram-webhook    Telegram Bot API
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod directory;
pub mod links;
pub mod llm;
pub mod prompt;
pub mod server;
pub mod telegram;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use api::AppState;
pub use config::Config;
pub use conversation::{ChatMessage, Role, SessionStats, SessionStore};
pub use directory::{normalize_phone, DirectoryError, PhoneDirectory};
pub use links::{extract_links, ExtractedLink};
pub use llm::{Completion, CompletionError, CompletionProvider, OpenAiClient};
pub use server::{build_router, Server};
pub use telegram::{Messenger, Notifier, NotifyOutcome, TelegramMessenger};
pub use webhook::{WebhookEvent, WebhookStatus};
