//! In-memory backend used by controller tests

use super::models::*;
use super::ProjectBackend;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    projects: Vec<Project>,
    next_id: i64,
    calls: Vec<String>,
}

/// Backend keeping whole project graphs in memory
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    fail_writes: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..Default::default()
            }),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().projects = projects;
        backend
    }

    /// Make every mutating call fail with HTTP 500
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn stored_task(&self, id: TaskId) -> Option<Task> {
        let state = self.state.lock().unwrap();
        state
            .projects
            .iter()
            .flat_map(|p| p.tasks.iter())
            .find(|t| t.id == id)
            .cloned()
    }

    /// Change a task behind the client's back
    pub fn edit_task(&self, id: TaskId, edit: impl FnOnce(&mut Task)) {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = find_task(&mut state.projects, id) {
            edit(task);
        }
    }

    fn record(&self, call: String) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        Ok(state)
    }

    fn write(&self, call: String) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            self.state.lock().unwrap().calls.push(call);
            return Err(AppError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        self.record(call)
    }
}

fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
    AppError::Api {
        status: 404,
        message: format!("{} not found: {}", what, id),
    }
}

fn find_task(projects: &mut [Project], id: TaskId) -> Option<&mut Task> {
    projects
        .iter_mut()
        .flat_map(|p| p.tasks.iter_mut())
        .find(|t| t.id == id)
}

fn find_item(projects: &mut [Project], id: ChecklistItemId) -> Option<&mut ChecklistItem> {
    projects
        .iter_mut()
        .flat_map(|p| p.tasks.iter_mut())
        .flat_map(|t| t.checklist.iter_mut())
        .find(|i| i.id == id)
}

fn find_comment(projects: &mut [Project], id: CommentId) -> Option<&mut Comment> {
    projects
        .iter_mut()
        .flat_map(|p| p.tasks.iter_mut())
        .flat_map(|t| t.comments.iter_mut())
        .find(|c| c.id == id)
}

fn next_id(state: &mut FakeState) -> i64 {
    state.next_id += 1;
    state.next_id
}

#[async_trait]
impl ProjectBackend for FakeBackend {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let state = self.record("list_projects".into())?;
        Ok(state.projects.clone())
    }

    async fn get_project_by_code(&self, code: &str) -> Result<Project> {
        let state = self.record(format!("get_project_by_code {}", code))?;
        state
            .projects
            .iter()
            .find(|p| p.code == code)
            .cloned()
            .ok_or_else(|| not_found("Project", code))
    }

    async fn get_project(&self, id: ProjectId) -> Result<Project> {
        let state = self.record(format!("get_project {}", id))?;
        state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| not_found("Project", id))
    }

    async fn create_project(&self, req: &CreateProjectRequest) -> Result<Project> {
        let mut state = self.write(format!("create_project {}", req.name))?;
        let id = next_id(&mut state);
        let project = Project {
            id,
            code: format!("code{}", id),
            name: req.name.clone(),
            description: req.description.clone(),
            due_date: req.due_date,
            tasks: Vec::new(),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: ProjectId, req: &UpdateProjectRequest) -> Result<Project> {
        let mut state = self.write(format!("update_project {}", id))?;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("Project", id))?;
        if let Some(name) = &req.name {
            project.name = name.clone();
        }
        if let Some(description) = &req.description {
            project.description = Some(description.clone());
        }
        if let Some(due_date) = req.due_date {
            project.due_date = Some(due_date);
        }
        Ok(project.clone())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<()> {
        let mut state = self.write(format!("delete_project {}", id))?;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(not_found("Project", id));
        }
        Ok(())
    }

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<Task>> {
        let state = self.record(format!("list_project_tasks {}", id))?;
        state
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.tasks.clone())
            .ok_or_else(|| not_found("Project", id))
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        let mut state = self.record(format!("get_task {}", id))?;
        find_task(&mut state.projects, id)
            .map(|t| t.clone())
            .ok_or_else(|| not_found("Task", id))
    }

    async fn create_task(&self, project_id: ProjectId, req: &CreateTaskRequest) -> Result<Task> {
        let mut state = self.write(format!("create_task {} {}", project_id, req.title))?;
        let id = next_id(&mut state);
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| not_found("Project", project_id))?;
        let task = Task {
            id,
            title: req.title.clone(),
            description: req.description.clone(),
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
            checklist: Vec::new(),
            comments: Vec::new(),
        };
        project.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, req: &UpdateTaskRequest) -> Result<Task> {
        let mut state = self.write(format!("update_task {}", id))?;
        let task = find_task(&mut state.projects, id).ok_or_else(|| not_found("Task", id))?;
        if let Some(title) = &req.title {
            task.title = title.clone();
        }
        if let Some(description) = &req.description {
            task.description = Some(description.clone());
        }
        if let Some(due_date) = req.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = req.priority {
            task.priority = priority;
        }
        Ok(task.clone())
    }

    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        let mut state = self.write(format!("update_task_status {} {}", id, status))?;
        let task = find_task(&mut state.projects, id).ok_or_else(|| not_found("Task", id))?;
        task.status = status;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        let mut state = self.write(format!("delete_task {}", id))?;
        let mut removed = false;
        for project in state.projects.iter_mut() {
            let before = project.tasks.len();
            project.tasks.retain(|t| t.id != id);
            removed |= project.tasks.len() != before;
        }
        if !removed {
            return Err(not_found("Task", id));
        }
        Ok(())
    }

    async fn add_checklist_item(
        &self,
        task_id: TaskId,
        req: &CreateChecklistItemRequest,
    ) -> Result<ChecklistItem> {
        let mut state = self.write(format!("add_checklist_item {}", task_id))?;
        let id = next_id(&mut state);
        let task =
            find_task(&mut state.projects, task_id).ok_or_else(|| not_found("Task", task_id))?;
        let item = ChecklistItem {
            id,
            text: req.text.clone(),
            checked: false,
        };
        task.checklist.push(item.clone());
        Ok(item)
    }

    async fn update_checklist_item(
        &self,
        id: ChecklistItemId,
        req: &UpdateChecklistItemRequest,
    ) -> Result<ChecklistItem> {
        let mut state = self.write(format!("update_checklist_item {}", id))?;
        let item =
            find_item(&mut state.projects, id).ok_or_else(|| not_found("Checklist item", id))?;
        if let Some(text) = &req.text {
            item.text = text.clone();
        }
        if let Some(checked) = req.checked {
            item.checked = checked;
        }
        Ok(item.clone())
    }

    async fn delete_checklist_item(&self, id: ChecklistItemId) -> Result<()> {
        let mut state = self.write(format!("delete_checklist_item {}", id))?;
        for task in state.projects.iter_mut().flat_map(|p| p.tasks.iter_mut()) {
            task.checklist.retain(|i| i.id != id);
        }
        Ok(())
    }

    async fn add_comment(&self, task_id: TaskId, req: &CreateCommentRequest) -> Result<Comment> {
        let mut state = self.write(format!("add_comment {}", task_id))?;
        let id = next_id(&mut state);
        let task =
            find_task(&mut state.projects, task_id).ok_or_else(|| not_found("Task", task_id))?;
        let comment = Comment {
            id,
            text: req.text.clone(),
            author_name: req.author_name.clone(),
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1).and_then(|d| d.and_hms_opt(12, 0, 0)),
        };
        task.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: CommentId, req: &UpdateCommentRequest) -> Result<Comment> {
        let mut state = self.write(format!("update_comment {}", id))?;
        let comment =
            find_comment(&mut state.projects, id).ok_or_else(|| not_found("Comment", id))?;
        comment.text = req.text.clone();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<()> {
        let mut state = self.write(format!("delete_comment {}", id))?;
        for task in state.projects.iter_mut().flat_map(|p| p.tasks.iter_mut()) {
            task.comments.retain(|c| c.id != id);
        }
        Ok(())
    }
}

// ===== Fixtures =====

pub fn task(id: TaskId, status: TaskStatus, due: Option<(i32, u32, u32)>) -> Task {
    Task {
        id,
        title: format!("Task {}", id),
        description: None,
        due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        priority: TaskPriority::Medium,
        status,
        checklist: Vec::new(),
        comments: Vec::new(),
    }
}

pub fn with_checklist(mut task: Task, items: &[(ChecklistItemId, bool)]) -> Task {
    task.checklist = items
        .iter()
        .map(|(id, checked)| ChecklistItem {
            id: *id,
            text: format!("Item {}", id),
            checked: *checked,
        })
        .collect();
    task
}

pub fn project(id: ProjectId, code: &str, name: &str, tasks: Vec<Task>) -> Project {
    Project {
        id,
        code: code.to_string(),
        name: name.to_string(),
        description: None,
        due_date: None,
        tasks,
    }
}
