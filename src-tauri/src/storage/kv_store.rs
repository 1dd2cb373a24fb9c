//! Persisted key-value store
//!
//! A small string-to-string map kept in memory and written through to a
//! single JSON file. Writes go to a temp file first and are renamed into
//! place so a crash never leaves a half-written store behind.
//!
//! A missing or unreadable file yields an empty store; a corrupted one is
//! moved aside as `.bak` so the next write starts fresh.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-backed key-value store
pub struct KvStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl KvStore {
    /// Open the store at `path`, loading whatever is already persisted
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        tracing::info!("Key-value store opened at {:?} ({} keys)", path, entries.len());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.update(key, |_| Ok((Some(value), ())))
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock();
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(true)
    }

    /// Read-modify-write one key under the store lock.
    ///
    /// `change` receives the current value and returns the value to store
    /// (`None` leaves the key untouched) plus a result for the caller.
    /// Memory is only updated once the new contents are on disk.
    pub fn update<T, F>(&self, key: &str, change: F) -> Result<T>
    where
        F: FnOnce(Option<&str>) -> Result<(Option<String>, T)>,
    {
        let mut entries = self.lock();
        let (value, output) = change(entries.get(key).map(String::as_str))?;

        if let Some(value) = value {
            let mut next = entries.clone();
            next.insert(key.to_string(), value);
            self.persist(&next)?;
            *entries = next;
        }

        Ok(output)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // Entries are plain strings; a panic mid-insert cannot leave them invalid.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Key-value store saved to {:?}", self.path);
        Ok(())
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read key-value store {:?}: {}", path, e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Key-value store {:?} is corrupted: {}", path, e);
            let backup = path.with_extension("bak");
            if let Err(e) = fs::rename(path, &backup) {
                tracing::warn!("Failed to back up corrupted store: {}", e);
            }
            BTreeMap::new()
        }
    }
}
