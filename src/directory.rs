//! Phone-Link Directory
//!
//! Durable phone number -> Telegram chat id mapping, stored as a single JSON
//! object on disk (`{"201001234567": 123456789}`). Every operation reads the
//! file; every mutation rewrites it whole. Mutations are serialized and the
//! new document is written to a temp file then renamed over the old one.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Directory file {path} is not a phone -> chat id map: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid phone number: {0:?}")]
    InvalidPhone(String),
}

/// Normalize a phone number for use as a directory key.
///
/// Strips surrounding whitespace and any leading `+`. Applying it twice
/// gives the same key as applying it once.
pub fn normalize_phone(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c == '+' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Summary of the directory contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub linked_phones: usize,
}

/// File-backed phone -> chat id directory
#[derive(Debug)]
pub struct PhoneDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PhoneDirectory {
    /// Open a directory backed by `path`. The file need not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Phone directory: {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the chat id linked to `phone`
    pub async fn resolve(&self, phone: &str) -> Result<Option<i64>, DirectoryError> {
        let key = normalize_phone(phone);
        let mapping = self.load().await?;
        Ok(mapping.get(&key).copied())
    }

    /// Whether `phone` has a linked chat
    pub async fn is_linked(&self, phone: &str) -> Result<bool, DirectoryError> {
        Ok(self.resolve(phone).await?.is_some())
    }

    /// Link `phone` to `chat_id`, replacing any previous link.
    ///
    /// Returns the normalized key that was stored.
    pub async fn link(&self, phone: &str, chat_id: i64) -> Result<String, DirectoryError> {
        let key = normalize_phone(phone);
        if key.is_empty() {
            return Err(DirectoryError::InvalidPhone(phone.to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let mut mapping = self.load().await?;
        let previous = mapping.insert(key.clone(), chat_id);
        self.save(&mapping).await?;

        match previous {
            Some(old) if old != chat_id => {
                info!("Relinked phone {} -> chat_id {} (was {})", key, chat_id, old)
            }
            _ => info!("Saved phone {} -> chat_id {}", key, chat_id),
        }
        Ok(key)
    }

    /// Snapshot of all links
    pub async fn entries(&self) -> Result<BTreeMap<String, i64>, DirectoryError> {
        self.load().await
    }

    pub async fn stats(&self) -> Result<DirectoryStats, DirectoryError> {
        Ok(DirectoryStats {
            linked_phones: self.load().await?.len(),
        })
    }

    /// Read the whole file; a missing file is an empty directory
    async fn load(&self) -> Result<BTreeMap<String, i64>, DirectoryError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Phone directory {} not found, treating as empty", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(DirectoryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&data).map_err(|source| DirectoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the whole file atomically via a sibling temp file
    async fn save(&self, mapping: &BTreeMap<String, i64>) -> Result<(), DirectoryError> {
        let data = serde_json::to_vec_pretty(mapping)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &data)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        debug!("Wrote {} links to {}", mapping.len(), self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> DirectoryError {
        DirectoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
