//! Remote data module
//!
//! This module provides everything that talks to the project backend:
//! - Wire models and request payloads
//! - The `ProjectBackend` seam the controllers depend on
//! - `ApiClient`, the HTTP implementation of that seam

pub mod client;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use client::ApiClient;
pub use models::*;

use crate::error::Result;
use async_trait::async_trait;

/// Operations the client needs from the project backend.
///
/// Every call either succeeds with the backend's canonical representation
/// or fails with an [`AppError`](crate::error::AppError); nothing is retried.
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    // ===== Projects =====

    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn get_project_by_code(&self, code: &str) -> Result<Project>;

    async fn get_project(&self, id: ProjectId) -> Result<Project>;

    async fn create_project(&self, req: &CreateProjectRequest) -> Result<Project>;

    async fn update_project(&self, id: ProjectId, req: &UpdateProjectRequest) -> Result<Project>;

    async fn delete_project(&self, id: ProjectId) -> Result<()>;

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<Task>>;

    // ===== Tasks =====

    async fn get_task(&self, id: TaskId) -> Result<Task>;

    async fn create_task(&self, project_id: ProjectId, req: &CreateTaskRequest) -> Result<Task>;

    async fn update_task(&self, id: TaskId, req: &UpdateTaskRequest) -> Result<Task>;

    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> Result<Task>;

    async fn delete_task(&self, id: TaskId) -> Result<()>;

    // ===== Checklist =====

    async fn add_checklist_item(
        &self,
        task_id: TaskId,
        req: &CreateChecklistItemRequest,
    ) -> Result<ChecklistItem>;

    async fn update_checklist_item(
        &self,
        id: ChecklistItemId,
        req: &UpdateChecklistItemRequest,
    ) -> Result<ChecklistItem>;

    async fn delete_checklist_item(&self, id: ChecklistItemId) -> Result<()>;

    // ===== Comments =====

    async fn add_comment(&self, task_id: TaskId, req: &CreateCommentRequest) -> Result<Comment>;

    async fn update_comment(&self, id: CommentId, req: &UpdateCommentRequest) -> Result<Comment>;

    async fn delete_comment(&self, id: CommentId) -> Result<()>;
}
