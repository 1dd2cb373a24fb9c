//! Bookmark service ("my projects")
//!
//! Keeps the user's local list of tracked projects in the key-value store
//! as a JSON array of `{code, id, name}` records. The list never holds two
//! records with the same non-empty code; records without a code are
//! deduplicated by id instead.
//!
//! Read failures (missing key, corrupt JSON) degrade to an empty list.
//! Every mutation bumps a version counter and publishes `ProjectsChanged`.

use crate::api::Project;
use crate::config::MY_PROJECTS_KEY;
use crate::error::Result;
use crate::events::{EventBus, UiEvent};
use crate::storage::KvStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lightweight local reference to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

impl BookmarkRecord {
    pub fn from_project(project: &Project) -> Self {
        Self {
            code: project.code.trim().to_string(),
            id: project.id.to_string(),
            name: project.name.clone(),
        }
    }

    fn matches(&self, other: &BookmarkRecord) -> bool {
        let code = other.code.trim();
        let id = other.id.trim();
        if !code.is_empty() {
            self.code.trim() == code
        } else {
            !id.is_empty() && self.id.trim() == id
        }
    }
}

/// Accept strings, numbers or null; older entries stored ids as numbers
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn parse_records(raw: Option<&str>) -> Vec<BookmarkRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable bookmark list: {}", e);
        Vec::new()
    })
}

/// Service for the locally bookmarked projects
pub struct BookmarkStore {
    store: Arc<KvStore>,
    events: Arc<EventBus>,
    version: AtomicU64,
}

impl BookmarkStore {
    pub fn new(store: Arc<KvStore>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            events,
            version: AtomicU64::new(0),
        }
    }

    /// All bookmarks, or an empty list if storage is unreadable
    pub fn list(&self) -> Vec<BookmarkRecord> {
        parse_records(self.store.get(MY_PROJECTS_KEY).as_deref())
    }

    /// Bookmark a project. Returns `false` if it was already bookmarked.
    pub fn add(&self, project: &Project) -> Result<bool> {
        self.add_record(BookmarkRecord::from_project(project))
    }

    pub fn add_record(&self, record: BookmarkRecord) -> Result<bool> {
        if record.code.trim().is_empty() && record.id.trim().is_empty() {
            tracing::debug!("Skipping bookmark without code or id");
            return Ok(false);
        }

        let added = self.store.update(MY_PROJECTS_KEY, |raw| {
            let mut records = parse_records(raw);
            if records.iter().any(|existing| existing.matches(&record)) {
                tracing::debug!("Project already bookmarked: {}", record.code);
                return Ok((None, false));
            }

            tracing::info!("Bookmarking project {} ({})", record.name, record.code);
            records.push(record);
            Ok((Some(serde_json::to_string(&records)?), true))
        })?;

        if added {
            self.changed();
        }
        Ok(added)
    }

    /// Drop every bookmark whose code or id equals `key`
    pub fn remove(&self, key: &str) -> Result<usize> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(0);
        }

        let removed = self.store.update(MY_PROJECTS_KEY, |raw| {
            let records = parse_records(raw);
            let before = records.len();
            let remaining: Vec<BookmarkRecord> = records
                .into_iter()
                .filter(|r| r.code.trim() != key && r.id.trim() != key)
                .collect();
            let removed = before - remaining.len();
            Ok((Some(serde_json::to_string(&remaining)?), removed))
        })?;

        tracing::info!("Removed {} bookmark(s) matching {}", removed, key);
        self.changed();
        Ok(removed)
    }

    pub fn remove_project(&self, project: &Project) -> Result<usize> {
        let by_code = self.remove(&project.code)?;
        let by_id = self.remove(&project.id.to_string())?;
        Ok(by_code + by_id)
    }

    /// Every code and id present in the bookmark list
    pub fn keys(&self) -> HashSet<String> {
        self.list()
            .into_iter()
            .flat_map(|r| [r.code, r.id])
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn contains(&self, project: &Project) -> bool {
        let keys = self.keys();
        let code = project.code.trim();
        if !code.is_empty() && keys.contains(code) {
            return true;
        }
        keys.contains(&project.id.to_string())
    }

    /// Incremented on every mutation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn changed(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
        self.events.publish(UiEvent::ProjectsChanged);
    }
}
