//! Dashboard commands
//!
//! Project grid filtering and the header search field.

use crate::api::Project;
use crate::app::AppState;
use crate::error::Result;
use crate::events::UiEvent;
use crate::services::{FilterMode, SearchOutcome};
use tauri::State;

/// Refetch the project list and return the visible grid
#[tauri::command]
pub async fn load_dashboard(state: State<'_, AppState>) -> Result<Vec<Project>> {
    state.dashboard.load_projects().await?;
    Ok(state.dashboard.visible().await)
}

#[tauri::command]
pub async fn get_visible_projects(state: State<'_, AppState>) -> Result<Vec<Project>> {
    Ok(state.dashboard.visible().await)
}

#[tauri::command]
pub async fn set_filter(state: State<'_, AppState>, mode: FilterMode) -> Result<Vec<Project>> {
    state.dashboard.set_filter(mode).await;
    Ok(state.dashboard.visible().await)
}

#[tauri::command]
pub async fn search_by_name(state: State<'_, AppState>, query: String) -> Result<Vec<Project>> {
    state.dashboard.search_by_name(&query).await;
    Ok(state.dashboard.visible().await)
}

/// Route whatever was typed into the header search field
#[tauri::command]
pub async fn submit_search(state: State<'_, AppState>, input: String) -> Result<SearchOutcome> {
    state.dashboard.submit_search(&input).await
}

#[tauri::command]
pub async fn show_my_projects(state: State<'_, AppState>) -> Result<Vec<Project>> {
    state.dashboard.show_my_projects().await;
    Ok(state.dashboard.visible().await)
}

/// Ask every listener to refetch the project list
#[tauri::command]
pub fn refresh_dashboard(state: State<'_, AppState>) {
    state.events.publish(UiEvent::DashboardRefresh);
}

#[tauri::command]
pub fn is_dev_mode_enabled(state: State<'_, AppState>) -> bool {
    state.dev_mode.is_enabled()
}
