//! Projects service
//!
//! Project-level CRUD on top of the backend. Creating a project bookmarks it
//! locally; deleting one drops its bookmark. Every change publishes
//! `ProjectsChanged` so the dashboard reloads.

use crate::api::{CreateProjectRequest, Project, ProjectBackend, ProjectId, UpdateProjectRequest};
use crate::error::{AppError, Result};
use crate::events::{EventBus, UiEvent};
use crate::services::bookmarks::BookmarkStore;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct ProjectsService {
    backend: Arc<dyn ProjectBackend>,
    bookmarks: Arc<BookmarkStore>,
    events: Arc<EventBus>,
}

impl ProjectsService {
    pub fn new(
        backend: Arc<dyn ProjectBackend>,
        bookmarks: Arc<BookmarkStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            backend,
            bookmarks,
            events,
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        tracing::debug!("Listing projects");
        self.backend.list_projects().await
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.backend.get_project(id).await
    }

    /// Create a project and bookmark it
    pub async fn create_project(
        &self,
        name: &str,
        due_date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Project name cannot be empty".to_string()));
        }

        let req = CreateProjectRequest {
            name: name.to_string(),
            due_date,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };

        tracing::info!("Creating project: {}", name);
        let project = match self.backend.create_project(&req).await {
            Ok(project) => project,
            Err(e) => {
                tracing::error!("Failed to create project {}: {}", name, e);
                self.events.publish(UiEvent::error("Could not create the project."));
                return Err(e);
            }
        };

        // A bookmark failure must not hide a project the backend already has
        let bookmarked = match self.bookmarks.add(&project) {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!("Could not bookmark new project {}: {}", project.code, e);
                false
            }
        };
        if !bookmarked {
            self.events.publish(UiEvent::ProjectsChanged);
        }

        self.events
            .publish(UiEvent::success(format!("Project created. Code: {}", project.code)));
        tracing::info!("Project created: {} ({})", project.name, project.code);
        Ok(project)
    }

    /// Partial update of name, description and due date
    pub async fn update_project(&self, id: ProjectId, mut req: UpdateProjectRequest) -> Result<Project> {
        if let Some(name) = req.name.as_mut() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(AppError::InvalidInput("Project name cannot be empty".to_string()));
            }
            *name = trimmed.to_string();
        }

        tracing::info!("Updating project {}", id);
        match self.backend.update_project(id, &req).await {
            Ok(project) => {
                self.events.publish(UiEvent::ProjectsChanged);
                self.events.publish(UiEvent::success("Project updated."));
                Ok(project)
            }
            Err(e) => {
                tracing::error!("Failed to update project {}: {}", id, e);
                self.events.publish(UiEvent::error("Could not update the project."));
                Err(e)
            }
        }
    }

    /// Delete a project and forget its bookmark
    pub async fn delete_project(&self, id: ProjectId, code: Option<&str>) -> Result<()> {
        tracing::info!("Deleting project {}", id);
        if let Err(e) = self.backend.delete_project(id).await {
            tracing::error!("Failed to delete project {}: {}", id, e);
            self.events.publish(UiEvent::error("Could not delete the project."));
            return Err(e);
        }

        // Removal notifies even when nothing matched
        for key in code.into_iter().map(str::to_string).chain([id.to_string()]) {
            if let Err(e) = self.bookmarks.remove(&key) {
                tracing::warn!("Could not remove bookmark {}: {}", key, e);
                self.events.publish(UiEvent::ProjectsChanged);
            }
        }

        self.events.publish(UiEvent::success("Project deleted."));
        Ok(())
    }

    /// Find a project by its share code and ask the UI to show it
    pub async fn lookup_by_code(&self, code: &str) -> Result<Project> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Project code is empty".to_string()));
        }

        let project = self.backend.get_project_by_code(code).await?;
        tracing::debug!("Code {} resolved to project {}", code, project.id);
        self.events.publish(UiEvent::OpenProjectLookup {
            project: Box::new(project.clone()),
        });
        Ok(project)
    }

    pub fn open_details(&self, project_id: ProjectId) {
        self.events.publish(UiEvent::OpenProjectDetails { project_id });
    }
}
