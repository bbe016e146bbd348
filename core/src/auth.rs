//! Bearer token storage and the `Authorization` header injector.
//!
//! # Design
//! `TokenStore` is the seam between the client and wherever the token
//! lives. `FileTokenStore` persists a small JSON key/value file with the
//! token under `TOKEN_KEY`; an absent key means unauthenticated.
//! `MemoryTokenStore` serves tests and server-side hosts that have no
//! persistent storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::warn;

use crate::error::StoreError;

/// Fixed storage key of the bearer token.
pub const TOKEN_KEY: &str = "admin_jwt";

pub trait TokenStore {
    /// Current token. Unreadable storage counts as no token.
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    fn has_token(&self) -> bool {
        self.get().is_some()
    }
}

/// Headers to attach to an outgoing call. Empty when there is no token.
pub fn auth_headers(store: &dyn TokenStore) -> Vec<(String, String)> {
    match store.get() {
        Some(token) if !token.is_empty() => {
            vec![("authorization".to_string(), format!("Bearer {token}"))]
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    // A writer that panicked cannot leave the slot half-written, so a
    // poisoned lock is still safe to use.
    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token persisted in a JSON object file, alongside any other keys already
/// stored there.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(TOKEN_KEY),
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable token store: {e}");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
