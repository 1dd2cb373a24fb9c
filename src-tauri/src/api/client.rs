//! HTTP client for the project backend
//!
//! Thin JSON-over-HTTP wrapper. Every non-2xx response becomes
//! [`AppError::Api`] carrying the backend's `message` (or `error`) field
//! when the body has one, and the status reason otherwise. A 204 is a
//! success with no body.

use super::models::*;
use super::ProjectBackend;
use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Client for the project backend REST API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8081/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid API URL {}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        tracing::info!("API client targeting {}", base_url);

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL; each segment is percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Generic(format!("API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!("{} {} failed: HTTP {} - {}", method, url.path(), status.as_u16(), message);
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Send a request whose successful response must carry a JSON body
    async fn send_json<T, B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(segments)?;
        let endpoint = format!("{} {}", method, url.path());
        let response = self.execute(method, url, body).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Err(AppError::EmptyResponse(endpoint));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.send_json(Method::GET, segments, None::<&()>).await
    }

    /// Send a request whose response body, if any, is ignored
    async fn send_empty(&self, method: Method, segments: &[&str]) -> Result<()> {
        let url = self.url(segments)?;
        self.execute(method, url, None::<&()>).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error response
async fn error_message(response: reqwest::Response) -> String {
    let fallback = response
        .status()
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string();

    let body = match response.json::<serde_json::Value>().await {
        Ok(body) => body,
        Err(_) => return fallback,
    };

    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}

#[async_trait]
impl ProjectBackend for ApiClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get(&["projects"]).await
    }

    async fn get_project_by_code(&self, code: &str) -> Result<Project> {
        self.get(&["projects", "by-code", code]).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.get(&["projects", &id.to_string()]).await
    }

    async fn create_project(&self, req: &CreateProjectRequest) -> Result<Project> {
        self.send_json(Method::POST, &["projects"], Some(req)).await
    }

    async fn update_project(&self, id: ProjectId, req: &UpdateProjectRequest) -> Result<Project> {
        self.send_json(Method::PATCH, &["projects", &id.to_string()], Some(req))
            .await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<()> {
        self.send_empty(Method::DELETE, &["projects", &id.to_string()])
            .await
    }

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<Task>> {
        self.get(&["projects", &id.to_string(), "tasks"]).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.get(&["tasks", &id.to_string()]).await
    }

    async fn create_task(&self, project_id: ProjectId, req: &CreateTaskRequest) -> Result<Task> {
        self.send_json(
            Method::POST,
            &["projects", &project_id.to_string(), "tasks"],
            Some(req),
        )
        .await
    }

    async fn update_task(&self, id: TaskId, req: &UpdateTaskRequest) -> Result<Task> {
        self.send_json(Method::PATCH, &["tasks", &id.to_string()], Some(req))
            .await
    }

    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        let req = UpdateTaskStatusRequest { status };
        self.send_json(
            Method::PATCH,
            &["tasks", &id.to_string(), "status"],
            Some(&req),
        )
        .await
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.send_empty(Method::DELETE, &["tasks", &id.to_string()])
            .await
    }

    async fn add_checklist_item(
        &self,
        task_id: TaskId,
        req: &CreateChecklistItemRequest,
    ) -> Result<ChecklistItem> {
        self.send_json(
            Method::POST,
            &["tasks", &task_id.to_string(), "checklist-items"],
            Some(req),
        )
        .await
    }

    async fn update_checklist_item(
        &self,
        id: ChecklistItemId,
        req: &UpdateChecklistItemRequest,
    ) -> Result<ChecklistItem> {
        self.send_json(
            Method::PATCH,
            &["checklist-items", &id.to_string()],
            Some(req),
        )
        .await
    }

    async fn delete_checklist_item(&self, id: ChecklistItemId) -> Result<()> {
        self.send_empty(Method::DELETE, &["checklist-items", &id.to_string()])
            .await
    }

    async fn add_comment(&self, task_id: TaskId, req: &CreateCommentRequest) -> Result<Comment> {
        self.send_json(
            Method::POST,
            &["tasks", &task_id.to_string(), "comments"],
            Some(req),
        )
        .await
    }

    async fn update_comment(&self, id: CommentId, req: &UpdateCommentRequest) -> Result<Comment> {
        self.send_json(Method::PATCH, &["comments", &id.to_string()], Some(req))
            .await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<()> {
        self.send_empty(Method::DELETE, &["comments", &id.to_string()])
            .await
    }
}
