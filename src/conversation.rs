//! Session Store
//!
//! Keeps the message transcript of every chat session in process memory.
//! A session starts with the system prompt and grows by one user turn per
//! request plus one assistant turn per successful completion. Sessions are
//! never evicted and do not survive a restart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a session transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Aggregate store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub sessions: usize,
    pub messages: usize,
}

/// In-memory transcripts keyed by session id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the transcript for `session_id`, creating it with
    /// `system_prompt` as its first message if the id is new.
    ///
    /// The prompt is only evaluated for new sessions.
    pub async fn get_or_create<F>(&self, session_id: Uuid, system_prompt: F) -> Vec<ChatMessage>
    where
        F: FnOnce() -> String,
    {
        if let Some(transcript) = self.sessions.read().await.get(&session_id) {
            return transcript.clone();
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have created it between the two locks
        let transcript = sessions.entry(session_id).or_insert_with(|| {
            info!("New chat session: {}", session_id);
            vec![ChatMessage::system(system_prompt())]
        });
        transcript.clone()
    }

    /// Record a user turn, creating the session with `system_prompt` first
    /// if the id is new. Returns the transcript including the new turn.
    pub async fn push_user_turn<F>(
        &self,
        session_id: Uuid,
        system_prompt: F,
        content: impl Into<String>,
    ) -> Vec<ChatMessage>
    where
        F: FnOnce() -> String,
    {
        let mut sessions = self.sessions.write().await;
        let transcript = sessions.entry(session_id).or_insert_with(|| {
            info!("New chat session: {}", session_id);
            vec![ChatMessage::system(system_prompt())]
        });
        transcript.push(ChatMessage::user(content));
        transcript.clone()
    }

    /// Append a message to an existing session.
    ///
    /// Returns `false` and stores nothing when the id is unknown.
    pub async fn append(&self, session_id: Uuid, role: Role, content: impl Into<String>) -> bool {
        let content = content.into();
        let mut sessions = self.sessions.write().await;
        let Some(transcript) = sessions.get_mut(&session_id) else {
            warn!("Dropping {} message for unknown session {}", role, session_id);
            return false;
        };

        debug!("Appending {} message ({} bytes) to session {}", role, content.len(), session_id);
        transcript.push(ChatMessage::new(role, content));
        true
    }

    /// Current transcript, if the session exists
    pub async fn transcript(&self, session_id: Uuid) -> Option<Vec<ChatMessage>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn stats(&self) -> SessionStats {
        let sessions = self.sessions.read().await;
        SessionStats {
            sessions: sessions.len(),
            messages: sessions.values().map(Vec::len).sum(),
        }
    }
}
