//! Chat Completions Client
//!
//! Sends a session transcript to an OpenAI-compatible `/chat/completions`
//! endpoint and returns the generated reply. Stateless; no retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::conversation::ChatMessage;

/// Completion errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("OPENAI_API_KEY not set - chat completions unavailable")]
    MissingApiKey,
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Completion API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Completion API returned no content")]
    EmptyResponse,
}

/// Generated reply with usage stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl Completion {
    /// Completion with no usage information
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: String::new(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}

/// Anything that can turn a transcript into a reply
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, CompletionError>;
}

/// API request
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// API response
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<&str>, base_url: &str, model: &str, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                warn!("HTTP client setup failed ({}), completions run without a timeout", e);
                Client::new()
            }
        };

        Self {
            client,
            api_key: api_key.map(|s| s.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_api_key.as_deref(),
            &config.openai_base_url,
            &config.model,
            config.llm_timeout,
        )
    }

    /// Check if API key is configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::MissingApiKey)?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        debug!("Calling completion API: model={}, messages={}", self.model, messages.len());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, body });
        }

        let result: CompletionResponse = response.json().await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        let completion = Completion {
            content,
            model: result.model.unwrap_or_else(|| self.model.clone()),
            prompt_tokens: result.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: result.usage.as_ref().map(|u| u.completion_tokens),
        };

        info!(
            "Completion response: model={}, in={:?}, out={:?}, len={}",
            completion.model,
            completion.prompt_tokens,
            completion.completion_tokens,
            completion.content.len()
        );

        Ok(completion)
    }
}
