//! Persistent key-value storage for client session data.
//!
//! A flat JSON object on disk. The bearer token lives under `TOKEN_KEY`.
//! It is read from disk once and then served from memory, since the store
//! asks for it synchronously on every operation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use employee_core::TokenProvider;
use tracing::warn;

pub const TOKEN_KEY: &str = "userToken";

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    /// `None` until the token has been loaded or written.
    token: Mutex<Option<Option<String>>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            token: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage from {:?}", self.path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse storage file {:?}", self.path))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create storage directory {:?}", dir))?;
        }
        let content = serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        fs::write(&self.path, content).with_context(|| format!("Failed to write storage to {:?}", self.path))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)?;
        if key == TOKEN_KEY {
            self.cache(Some(value.to_string()));
        }
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.save(&entries)?;
        }
        if key == TOKEN_KEY {
            self.cache(None);
        }
        Ok(existed)
    }

    fn cache(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token);
        }
    }
}

impl TokenProvider for FileTokenStore {
    fn bearer_token(&self) -> Option<String> {
        let mut slot = match self.token.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let token = slot.get_or_insert_with(|| match self.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                warn!("unreadable token storage: {err:#}");
                None
            }
        });
        token.clone().filter(|t| !t.is_empty())
    }
}
