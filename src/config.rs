//! Configuration management

use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default chat completions endpoint base
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Default phone directory file
pub const DEFAULT_DIRECTORY_PATH: &str = "chat_id_store.json";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Model provider API key (chat requests fail without it)
    pub openai_api_key: Option<String>,

    /// Chat completions base URL
    pub openai_base_url: String,

    /// Model name sent with every completion request
    pub model: String,

    /// Optional request timeout for completion calls
    pub llm_timeout: Option<Duration>,

    /// Telegram bot token (notifications disabled when missing)
    pub telegram_bot_token: Option<String>,

    /// Listen address
    pub bind_addr: IpAddr,

    /// Listen port
    pub port: u16,

    /// JSON file holding phone -> chat id links
    pub directory_path: PathBuf,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            llm_timeout: None,
            telegram_bot_token: None,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            directory_path: PathBuf::from(DEFAULT_DIRECTORY_PATH),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let openai_api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.trim().is_empty());

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.openai_base_url);

        let model = lookup("STAYBOT_MODEL").unwrap_or(defaults.model);

        let llm_timeout = match lookup("STAYBOT_LLM_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(
                v.parse()
                    .with_context(|| format!("STAYBOT_LLM_TIMEOUT_SECS is not a number: {}", v))?,
            )),
            None => None,
        };

        let bind_addr = match lookup("STAYBOT_BIND_ADDR") {
            Some(v) => v
                .parse()
                .with_context(|| format!("STAYBOT_BIND_ADDR is not an IP address: {}", v))?,
            None => defaults.bind_addr,
        };

        let port = match lookup("PORT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", v))?,
            None => defaults.port,
        };

        let directory_path = lookup("CHAT_ID_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.directory_path);

        let log_format = match lookup("STAYBOT_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            model,
            llm_timeout,
            telegram_bot_token,
            bind_addr,
            port,
            directory_path,
            log_format,
        })
    }

    /// Socket address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert!(config.telegram_bot_token.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.directory_path, PathBuf::from("chat_id_store.json"));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PORT", "9090"),
            ("STAYBOT_BIND_ADDR", "127.0.0.1"),
            ("STAYBOT_LLM_TIMEOUT_SECS", "30"),
            ("STAYBOT_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_base_url, "http://localhost:9000/v1");
        assert_eq!(config.telegram_bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.llm_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_secrets_are_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "  "), ("TELEGRAM_BOT_TOKEN", "")]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert!(config.telegram_bot_token.is_none());
    }

    #[test]
    fn test_invalid_port_is_error() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}
