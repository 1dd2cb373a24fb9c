//! Project-related commands
//!
//! Project CRUD and lookup by share code.

use crate::api::{Project, ProjectId, UpdateProjectRequest};
use crate::app::AppState;
use crate::error::Result;
use chrono::NaiveDate;
use tauri::State;

/// List every project the backend knows about
#[tauri::command]
pub async fn list_projects(state: State<'_, AppState>) -> Result<Vec<Project>> {
    state.projects.list_projects().await
}

#[tauri::command]
pub async fn get_project(state: State<'_, AppState>, id: ProjectId) -> Result<Project> {
    state.projects.get_project(id).await
}

/// Create a project and add it to "my projects"
#[tauri::command]
pub async fn create_project(
    state: State<'_, AppState>,
    name: String,
    due_date: Option<NaiveDate>,
    description: Option<String>,
) -> Result<Project> {
    state
        .projects
        .create_project(&name, due_date, description)
        .await
}

/// Partially update a project
#[tauri::command]
pub async fn update_project(
    state: State<'_, AppState>,
    id: ProjectId,
    changes: UpdateProjectRequest,
) -> Result<Project> {
    let project = state.projects.update_project(id, changes).await?;
    state.board.apply_project_details(&project).await;
    Ok(project)
}

#[tauri::command]
pub async fn delete_project(
    state: State<'_, AppState>,
    id: ProjectId,
    code: Option<String>,
) -> Result<()> {
    state.projects.delete_project(id, code.as_deref()).await
}

/// Resolve a share code and open the lookup modal
#[tauri::command]
pub async fn lookup_project_by_code(state: State<'_, AppState>, code: String) -> Result<Project> {
    state.projects.lookup_by_code(&code).await
}

#[tauri::command]
pub fn open_project_details(state: State<'_, AppState>, id: ProjectId) {
    state.projects.open_details(id);
}
