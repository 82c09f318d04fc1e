//! API key storage
//!
//! The key is the only credential the canvas holds. Reads never fail hard:
//! a store that cannot be read behaves as if no key were saved.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

use crate::config::canvas_dir;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to create credential directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write credential file: {0}")]
    Write(std::io::Error),

    #[error("Failed to delete credential file: {0}")]
    Delete(std::io::Error),

    #[error("Failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save(&self, api_key: &str) -> Result<(), CredentialError>;

    async fn get(&self) -> Option<String>;

    async fn clear(&self) -> Result<(), CredentialError>;
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    api_key: String,
}

/// Stores the key as JSON at `~/.chat-canvas/credentials.json` (or a
/// custom path), readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        canvas_dir().join("credentials.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, api_key: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                log::error!("Failed to create {}: {}", parent.display(), e);
                CredentialError::CreateDir(e)
            })?;
        }

        let content = serde_json::to_string_pretty(&StoredCredential {
            api_key: api_key.to_string(),
        })?;
        fs::write(&self.path, content).await.map_err(|e| {
            log::error!("Failed to save API key: {}", e);
            CredentialError::Write(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }

    async fn get(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                log::error!("Failed to retrieve API key: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<StoredCredential>(&content) {
            Ok(stored) if !stored.api_key.is_empty() => Some(stored.api_key),
            Ok(_) => None,
            Err(e) => {
                log::error!("Credential file {} is malformed: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        if self.path.exists() {
            fs::remove_file(&self.path).await.map_err(|e| {
                log::error!("Failed to clear API key: {}", e);
                CredentialError::Delete(e)
            })?;
        }
        Ok(())
    }
}

/// Process-local store for tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    key: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            key: RwLock::new(Some(api_key.into())),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, api_key: &str) -> Result<(), CredentialError> {
        *self.key.write().await = Some(api_key.to_string());
        Ok(())
    }

    async fn get(&self) -> Option<String> {
        self.key.read().await.clone()
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.key.write().await = None;
        Ok(())
    }
}
