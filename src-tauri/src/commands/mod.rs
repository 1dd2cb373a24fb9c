//! Tauri commands exposed to the frontend
//!
//! This module organizes commands into logical submodules:
//! - `projects`: Project CRUD and code lookup
//! - `board`: Kanban board, task details, checklist and comments
//! - `dashboard`: Project grid filtering and header search
//! - `bookmarks`: Locally bookmarked projects

pub mod board;
pub mod bookmarks;
pub mod dashboard;
pub mod projects;

use crate::app::AppState;
use crate::error::Result;
use tauri::State;

// Re-export all commands for convenient registration in main.rs
pub use board::*;
pub use bookmarks::*;
pub use dashboard::*;
pub use projects::*;

// ===== General Commands =====

/// Get application information
#[tauri::command]
pub async fn get_app_info(state: State<'_, AppState>) -> Result<AppInfo> {
    Ok(AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_base_url: state.config.api_base_url.clone(),
        data_dir: state.config.data_dir.to_string_lossy().to_string(),
        dev_mode: state.dev_mode.is_enabled(),
    })
}

/// Application information structure
#[derive(serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub api_base_url: String,
    pub data_dir: String,
    pub dev_mode: bool,
}
