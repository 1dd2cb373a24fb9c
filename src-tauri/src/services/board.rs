//! Board service
//!
//! Owns the in-memory snapshot of the project shown on the Kanban board and
//! mediates every change to it.
//!
//! Status changes are committed in two phases:
//! 1. validate against the checklist, apply locally, persist via the status
//!    endpoint;
//! 2. on success re-fetch the single task and splice it in, on failure drop
//!    the whole snapshot and reload it from the backend.
//!
//! Checklist and comment edits are not optimistic: each mutation is followed
//! by an authoritative re-fetch of the owning task.
//!
//! All mutations on a given task are serialized through a per-task gate, so
//! a second action on the same task starts only after the first one has
//! been reconciled.

use crate::api::{
    ChecklistItemId, CommentId, CreateChecklistItemRequest, CreateCommentRequest,
    CreateTaskRequest, Project, ProjectBackend, ProjectId, Task, TaskId, TaskPriority, TaskStatus,
    UpdateChecklistItemRequest, UpdateCommentRequest, UpdateTaskRequest,
};
use crate::config::DEFAULT_COMMENT_AUTHOR;
use crate::error::{AppError, Result};
use crate::events::{EventBus, UiEvent};
use crate::services::transitions::{check_task, DragEnd, DropTarget, TransitionError, TransitionOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Load state of the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum BoardStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Tasks partitioned by status, each column in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardColumns {
    pub todo: Vec<Task>,
    pub doing: Vec<Task>,
    pub done: Vec<Task>,
}

/// Display order within a column: due date ascending, undated tasks last,
/// then id ascending
pub fn column_order(a: &Task, b: &Task) -> Ordering {
    let by_due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due.then(a.id.cmp(&b.id))
}

/// Partition tasks into the three board columns
pub fn project_columns(tasks: &[Task]) -> BoardColumns {
    let mut columns = BoardColumns::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => columns.todo.push(task.clone()),
            TaskStatus::Doing => columns.doing.push(task.clone()),
            TaskStatus::Done => columns.done.push(task.clone()),
        }
    }
    columns.todo.sort_by(column_order);
    columns.doing.sort_by(column_order);
    columns.done.sort_by(column_order);
    columns
}

/// Field edits from the task detail view
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    /// Goes through the same checklist rules as a drag-and-drop move
    pub status: Option<TaskStatus>,
}

impl TaskEdit {
    fn field_update(&self) -> Result<UpdateTaskRequest> {
        let title = match &self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(AppError::InvalidInput("Task title cannot be empty".to_string()))
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };

        Ok(UpdateTaskRequest {
            title,
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
        })
    }
}

struct BoardState {
    code: Option<String>,
    project: Option<Project>,
    status: BoardStatus,
}

/// One async mutex per task id
#[derive(Default)]
struct TaskGates {
    gates: Mutex<HashMap<TaskId, Arc<Mutex<()>>>>,
}

impl TaskGates {
    async fn enter(&self, task_id: TaskId) -> OwnedMutexGuard<()> {
        let gate = self
            .gates
            .lock()
            .await
            .entry(task_id)
            .or_default()
            .clone();
        gate.lock_owned().await
    }

    /// Drop the gate of a task that no longer exists
    async fn forget(&self, task_id: TaskId) {
        self.gates.lock().await.remove(&task_id);
    }

    /// Drop every gate nobody is holding or waiting on
    async fn prune(&self) {
        self.gates
            .lock()
            .await
            .retain(|_, gate| Arc::strong_count(gate) > 1);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.gates.lock().await.len()
    }
}

/// Board State Controller
pub struct BoardController {
    backend: Arc<dyn ProjectBackend>,
    events: Arc<EventBus>,
    state: RwLock<BoardState>,
    gates: TaskGates,
}

impl BoardController {
    pub fn new(backend: Arc<dyn ProjectBackend>, events: Arc<EventBus>) -> Self {
        Self {
            backend,
            events,
            state: RwLock::new(BoardState {
                code: None,
                project: None,
                status: BoardStatus::Idle,
            }),
            gates: TaskGates::default(),
        }
    }

    // ===== Reads =====

    pub async fn snapshot(&self) -> Option<Project> {
        self.state.read().await.project.clone()
    }

    pub async fn status(&self) -> BoardStatus {
        self.state.read().await.status.clone()
    }

    pub async fn columns(&self) -> Option<BoardColumns> {
        self.state
            .read()
            .await
            .project
            .as_ref()
            .map(|p| project_columns(&p.tasks))
    }

    pub async fn task(&self, task_id: TaskId) -> Option<Task> {
        self.state
            .read()
            .await
            .project
            .as_ref()
            .and_then(|p| p.task(task_id).cloned())
    }

    async fn active_project_id(&self) -> Result<ProjectId> {
        self.state
            .read()
            .await
            .project
            .as_ref()
            .map(|p| p.id)
            .ok_or(AppError::NoActiveProject)
    }

    // ===== Loading =====

    /// Fetch the full project graph for `code` and make it the snapshot
    pub async fn load(&self, code: &str) -> Result<Project> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Project code is empty".to_string()));
        }

        {
            let mut state = self.state.write().await;
            state.code = Some(code.clone());
            state.status = BoardStatus::Loading;
        }

        tracing::info!("Loading board for project {}", code);
        let result = self.backend.get_project_by_code(&code).await;

        let mut state = self.state.write().await;
        if state.code.as_deref() != Some(code.as_str()) {
            tracing::debug!("Discarding stale load for project {}", code);
            return result;
        }

        match result {
            Ok(project) => {
                tracing::info!("Board loaded: {} ({} tasks)", project.name, project.tasks.len());
                state.project = Some(project.clone());
                state.status = BoardStatus::Ready;
                drop(state);
                self.board_updated(Some(code));
                Ok(project)
            }
            Err(e) => {
                tracing::error!("Failed to load project {}: {}", code, e);
                state.project = None;
                state.status = if e.is_not_found() {
                    BoardStatus::Failed("Project not found.".to_string())
                } else {
                    BoardStatus::Failed(e.to_string())
                };
                drop(state);
                self.board_updated(Some(code));
                Err(e)
            }
        }
    }

    /// Reload the current project from scratch
    pub async fn reload(&self) -> Result<Project> {
        let code = self
            .state
            .read()
            .await
            .code
            .clone()
            .ok_or(AppError::NoActiveProject)?;
        self.load(&code).await
    }

    /// Leave the board
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            state.code = None;
            state.project = None;
            state.status = BoardStatus::Idle;
        }
        self.gates.prune().await;
    }

    /// Copy edited project fields into the snapshot if it shows that project
    pub async fn apply_project_details(&self, updated: &Project) {
        let mut state = self.state.write().await;
        let Some(project) = state.project.as_mut().filter(|p| p.id == updated.id) else {
            return;
        };
        project.name = updated.name.clone();
        project.description = updated.description.clone();
        project.due_date = updated.due_date;
        let code = project.code.clone();
        drop(state);
        self.board_updated(Some(code));
    }

    // ===== Status transitions =====

    /// Handle the end of a drag gesture
    pub async fn handle_drag_end(&self, event: DragEnd) -> Result<TransitionOutcome> {
        let Some(over) = event.over else {
            return Ok(TransitionOutcome::NoTarget);
        };

        let target = match over {
            DropTarget::Column(status) => status,
            DropTarget::Task(other) => match self.task(other).await {
                Some(task) => task.status,
                None => return Ok(TransitionOutcome::NoTarget),
            },
            DropTarget::Unknown(raw) => {
                let reason = TransitionError::UnknownStatus(raw);
                self.events.publish(UiEvent::error(reason.to_string()));
                return Ok(TransitionOutcome::Rejected(reason));
            }
        };

        self.move_task(event.task_id, target).await
    }

    /// Move a task to another column, enforcing the checklist rules
    pub async fn move_task(&self, task_id: TaskId, target: TaskStatus) -> Result<TransitionOutcome> {
        let _gate = self.gates.enter(task_id).await;
        self.transition(task_id, target).await
    }

    /// Two-phase status commit. Callers must hold the task's gate.
    async fn transition(&self, task_id: TaskId, target: TaskStatus) -> Result<TransitionOutcome> {
        let (code, previous) = {
            let mut state = self.state.write().await;
            let project = state.project.as_mut().ok_or(AppError::NoActiveProject)?;
            let code = project.code.clone();
            let task = project
                .task_mut(task_id)
                .ok_or(AppError::TaskNotFound(task_id))?;

            if task.status == target {
                return Ok(TransitionOutcome::Unchanged);
            }

            if let Err(reason) = check_task(task, target) {
                tracing::info!("Rejected move of task {} to {}: {}", task_id, target, reason);
                self.events.publish(UiEvent::error(reason.to_string()));
                return Ok(TransitionOutcome::Rejected(reason));
            }

            let previous = task.status;
            task.status = target;
            (code, previous)
        };

        tracing::info!("Moving task {} from {} to {}", task_id, previous, target);
        self.board_updated(Some(code));

        let persisted = match self.backend.update_task_status(task_id, target).await {
            Ok(task) => task,
            Err(e) => {
                tracing::error!("Failed to persist status of task {}: {}", task_id, e);
                self.events
                    .publish(UiEvent::error("Could not move the task. Please try again."));
                if let Err(reload_err) = self.reload().await {
                    tracing::warn!("Reload after failed move also failed: {}", reload_err);
                }
                return Err(e);
            }
        };

        match self.backend.get_task(task_id).await {
            Ok(task) => {
                self.splice(task.clone()).await;
                Ok(TransitionOutcome::Applied(task))
            }
            Err(e) => {
                tracing::warn!("Could not reconcile task {} after move: {}", task_id, e);
                if let Err(reload_err) = self.reload().await {
                    tracing::warn!("Reload after reconcile failure failed: {}", reload_err);
                }
                Ok(TransitionOutcome::Applied(persisted))
            }
        }
    }

    // ===== Tasks =====

    /// Create a TODO/MEDIUM task with just a title on the active project
    pub async fn quick_add_task(&self, title: &str) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Task title cannot be empty".to_string()));
        }

        let project_id = self.active_project_id().await?;
        tracing::info!("Creating task '{}' in project {}", title, project_id);

        let task = match self
            .backend
            .create_task(project_id, &CreateTaskRequest::quick(title))
            .await
        {
            Ok(task) => task,
            Err(e) => {
                tracing::error!("Failed to create task: {}", e);
                self.events.publish(UiEvent::error("Could not create the task."));
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        if let Some(project) = state.project.as_mut().filter(|p| p.id == project_id) {
            project.tasks.push(task.clone());
            let code = project.code.clone();
            drop(state);
            self.board_updated(Some(code));
        }

        Ok(task)
    }

    /// Fetch the full task for the detail view and refresh the snapshot copy
    pub async fn open_task(&self, task_id: TaskId) -> Result<Task> {
        self.refresh_task(task_id).await
    }

    /// Apply detail-view edits. A status change is validated exactly like a
    /// drag-and-drop move.
    pub async fn update_task(&self, task_id: TaskId, edit: TaskEdit) -> Result<Task> {
        let fields = edit.field_update()?;
        let _gate = self.gates.enter(task_id).await;

        if let Some(target) = edit.status {
            self.active_project_id().await?;
            let task = self
                .task(task_id)
                .await
                .ok_or(AppError::TaskNotFound(task_id))?;
            if let Err(reason) = check_task(&task, target) {
                self.events.publish(UiEvent::error(reason.to_string()));
                return Err(reason.into());
            }
        }

        if !fields.is_empty() {
            if let Err(e) = self.backend.update_task(task_id, &fields).await {
                tracing::error!("Failed to update task {}: {}", task_id, e);
                self.events.publish(UiEvent::error("Could not update the task."));
                return Err(e);
            }
        }

        if let Some(target) = edit.status {
            match self.transition(task_id, target).await? {
                TransitionOutcome::Rejected(reason) => return Err(reason.into()),
                TransitionOutcome::Applied(task) if fields.is_empty() => return Ok(task),
                _ => {}
            }
        }

        self.refresh_task(task_id).await
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Result<()> {
        let _gate = self.gates.enter(task_id).await;

        if let Err(e) = self.backend.delete_task(task_id).await {
            tracing::error!("Failed to delete task {}: {}", task_id, e);
            self.events.publish(UiEvent::error("Could not delete the task."));
            return Err(e);
        }
        self.gates.forget(task_id).await;

        let mut state = self.state.write().await;
        if let Some(project) = state.project.as_mut() {
            project.tasks.retain(|t| t.id != task_id);
            let code = project.code.clone();
            drop(state);
            self.board_updated(Some(code));
        }

        tracing::info!("Task {} deleted", task_id);
        Ok(())
    }

    // ===== Checklist =====

    pub async fn add_checklist_item(&self, task_id: TaskId, text: &str) -> Result<Task> {
        let text = non_empty(text, "Checklist item text")?;
        let req = CreateChecklistItemRequest { text };
        self.mutate_then_refresh(task_id, "add the checklist item", || {
            self.backend.add_checklist_item(task_id, &req)
        })
        .await
    }

    pub async fn update_checklist_item(
        &self,
        task_id: TaskId,
        item_id: ChecklistItemId,
        req: UpdateChecklistItemRequest,
    ) -> Result<Task> {
        if let Some(text) = &req.text {
            non_empty(text, "Checklist item text")?;
        }
        self.mutate_then_refresh(task_id, "update the checklist item", || {
            self.backend.update_checklist_item(item_id, &req)
        })
        .await
    }

    /// Flip an item's completion flag as currently shown on the board. The
    /// flag is read under the task's gate, so back-to-back toggles alternate.
    pub async fn toggle_checklist_item(&self, task_id: TaskId, item_id: ChecklistItemId) -> Result<Task> {
        let _gate = self.gates.enter(task_id).await;
        let checked = self
            .task(task_id)
            .await
            .ok_or(AppError::TaskNotFound(task_id))?
            .checklist
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.checked)
            .ok_or_else(|| AppError::Generic(format!("Checklist item not found: {}", item_id)))?;

        let req = UpdateChecklistItemRequest {
            text: None,
            checked: Some(!checked),
        };
        self.mutate_locked(task_id, "update the checklist item", || {
            self.backend.update_checklist_item(item_id, &req)
        })
        .await
    }

    pub async fn delete_checklist_item(&self, task_id: TaskId, item_id: ChecklistItemId) -> Result<Task> {
        self.mutate_then_refresh(task_id, "delete the checklist item", || {
            self.backend.delete_checklist_item(item_id)
        })
        .await
    }

    // ===== Comments =====

    pub async fn add_comment(&self, task_id: TaskId, text: &str, author: Option<&str>) -> Result<Task> {
        let text = non_empty(text, "Comment")?;
        let author_name = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_COMMENT_AUTHOR)
            .to_string();
        let req = CreateCommentRequest { text, author_name };
        self.mutate_then_refresh(task_id, "add the comment", || {
            self.backend.add_comment(task_id, &req)
        })
        .await
    }

    pub async fn update_comment(&self, task_id: TaskId, comment_id: CommentId, text: &str) -> Result<Task> {
        let req = UpdateCommentRequest {
            text: non_empty(text, "Comment")?,
        };
        self.mutate_then_refresh(task_id, "update the comment", || {
            self.backend.update_comment(comment_id, &req)
        })
        .await
    }

    pub async fn delete_comment(&self, task_id: TaskId, comment_id: CommentId) -> Result<Task> {
        self.mutate_then_refresh(task_id, "delete the comment", || {
            self.backend.delete_comment(comment_id)
        })
        .await
    }

    // ===== Internals =====

    /// Run one mutation against a task, then re-fetch the task
    async fn mutate_then_refresh<F, Fut, T>(&self, task_id: TaskId, action: &str, mutation: F) -> Result<Task>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _gate = self.gates.enter(task_id).await;
        self.mutate_locked(task_id, action, mutation).await
    }

    /// Same as [`Self::mutate_then_refresh`] for a caller already holding the gate
    async fn mutate_locked<F, Fut, T>(&self, task_id: TaskId, action: &str, mutation: F) -> Result<Task>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Err(e) = mutation().await {
            tracing::error!("Failed to {} on task {}: {}", action, task_id, e);
            self.events
                .publish(UiEvent::error(format!("Could not {}.", action)));
            return Err(e);
        }

        self.refresh_task(task_id).await
    }

    async fn refresh_task(&self, task_id: TaskId) -> Result<Task> {
        match self.backend.get_task(task_id).await {
            Ok(task) => {
                self.splice(task.clone()).await;
                Ok(task)
            }
            Err(e) => {
                tracing::error!("Failed to fetch task {}: {}", task_id, e);
                self.events.publish(UiEvent::error("Could not load the task."));
                Err(e)
            }
        }
    }

    /// Replace the snapshot's copy of a task with the backend's
    async fn splice(&self, task: Task) {
        let mut state = self.state.write().await;
        let Some(project) = state.project.as_mut() else {
            return;
        };
        let Some(slot) = project.task_mut(task.id) else {
            tracing::debug!("Task {} is not on the current board, skipping splice", task.id);
            return;
        };

        tracing::debug!("Reconciled task {} ({})", task.id, task.status);
        *slot = task;
        let code = project.code.clone();
        drop(state);
        self.board_updated(Some(code));
    }

    fn board_updated(&self, project_code: Option<String>) {
        self.events.publish(UiEvent::BoardUpdated { project_code });
    }
}

fn non_empty(text: &str, what: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(text.to_string())
}
