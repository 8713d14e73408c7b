//! Persistence for the OAuth token triple.
//!
//! Tokens live in a flat string key/value store, one entry per field, with
//! the expiry kept as an epoch-milliseconds timestamp.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::authorize::Access;

pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";
pub const TOKEN_EXPIRES_KEY: &str = "spotify_token_expires";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Token store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten after every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened token store");
        Ok(FileStore { path, entries })
    }

    /// Writes a sibling temp file readable only by the owner, then renames
    /// it over the store.
    fn flush(&self) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct TokenStore {
    store: Box<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        TokenStore {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Stores a fresh token grant. A grant without a refresh token keeps
    /// the previously stored one.
    pub fn save(&mut self, access: &Access, now_ms: i64) -> Result<(), StorageError> {
        self.store
            .set(ACCESS_TOKEN_KEY, access.access_token.clone())?;
        if let Some(refresh_token) = &access.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token.clone())?;
        }
        let expires_at = now_ms.saturating_add(access.expires_in.saturating_mul(1000));
        self.store.set(TOKEN_EXPIRES_KEY, expires_at.to_string())?;
        tracing::debug!(expires_at, "Stored access token");
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.store
            .get(TOKEN_EXPIRES_KEY)
            .and_then(|value| value.parse().ok())
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expires_at() {
            Some(expires_at) => now_ms > expires_at,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        self.access_token().is_some() && !self.is_expired_at(now_ms)
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(now_millis())
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(TOKEN_EXPIRES_KEY)?;
        Ok(())
    }
}
