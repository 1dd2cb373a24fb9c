//! Bookmark commands
//!
//! The locally stored "my projects" list.

use crate::app::AppState;
use crate::error::Result;
use crate::services::BookmarkRecord;
use tauri::State;

#[tauri::command]
pub fn list_bookmarks(state: State<'_, AppState>) -> Vec<BookmarkRecord> {
    state.bookmarks.list()
}

/// Bookmark a project. Returns `false` if it already was.
#[tauri::command]
pub fn add_bookmark(state: State<'_, AppState>, record: BookmarkRecord) -> Result<bool> {
    state.bookmarks.add_record(record)
}

/// Remove bookmarks whose code or id equals `key`
#[tauri::command]
pub fn remove_bookmark(state: State<'_, AppState>, key: String) -> Result<usize> {
    state.bookmarks.remove(&key)
}

/// Every bookmarked code and id, for card badges
#[tauri::command]
pub fn bookmark_keys(state: State<'_, AppState>) -> Vec<String> {
    let mut keys: Vec<String> = state.bookmarks.keys().into_iter().collect();
    keys.sort();
    keys
}
