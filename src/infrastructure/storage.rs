use crate::domain::error::SessionGuardResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Keyed string storage for tokens
///
/// The session manager is the sole writer; other application components
/// read the access token for authorization headers.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> SessionGuardResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> SessionGuardResult<()>;
    async fn remove(&self, key: &str) -> SessionGuardResult<()>;
}

/// In-memory token store
///
/// Suitable for tests and for embedders that handle persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> SessionGuardResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionGuardResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionGuardResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed token store
///
/// Persists entries as a flat JSON object so tokens survive process
/// restarts. Every mutation rewrites the file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store, loading any previously persisted entries
    pub fn open(path: impl AsRef<Path>) -> SessionGuardResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        debug!("Opened token store at {}", path.display());
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self) -> SessionGuardResult<()> {
        let entries = self.entries.read().await;
        let content = serde_json::to_string_pretty(&*entries)?;
        drop(entries);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> SessionGuardResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionGuardResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.persist().await
    }

    async fn remove(&self, key: &str) -> SessionGuardResult<()> {
        let removed = self.entries.write().await.remove(key);
        if removed.is_some() {
            self.persist().await?;
        }
        Ok(())
    }
}
