//! Board commands
//!
//! Kanban board loading, drag-and-drop, task details, checklist and comments.

use crate::api::{ChecklistItemId, CommentId, Project, Task, TaskId, TaskStatus, UpdateChecklistItemRequest};
use crate::app::AppState;
use crate::error::Result;
use crate::services::{BoardColumns, BoardStatus, DragEnd, DropTarget, TaskEdit, TransitionOutcome};
use serde::Serialize;
use tauri::State;

/// Everything the board view renders
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub status: BoardStatus,
    pub project: Option<Project>,
    pub columns: Option<BoardColumns>,
}

/// Load the project with `code` onto the board
#[tauri::command]
pub async fn load_board(state: State<'_, AppState>, code: String) -> Result<BoardView> {
    state.board.load(&code).await?;
    Ok(board_view(&state).await)
}

#[tauri::command]
pub async fn reload_board(state: State<'_, AppState>) -> Result<BoardView> {
    state.board.reload().await?;
    Ok(board_view(&state).await)
}

#[tauri::command]
pub async fn get_board(state: State<'_, AppState>) -> Result<BoardView> {
    Ok(board_view(&state).await)
}

#[tauri::command]
pub async fn close_board(state: State<'_, AppState>) -> Result<()> {
    state.board.close().await;
    Ok(())
}

/// End of a drag gesture. `over` is the droppable id: a status name for a
/// column, a task id for a card, or nothing when dropped outside.
#[tauri::command]
pub async fn drag_end(
    state: State<'_, AppState>,
    task_id: TaskId,
    over: Option<String>,
) -> Result<TransitionOutcome> {
    let event = DragEnd::new(task_id, over.as_deref().map(DropTarget::parse));
    state.board.handle_drag_end(event).await
}

#[tauri::command]
pub async fn move_task(
    state: State<'_, AppState>,
    task_id: TaskId,
    status: TaskStatus,
) -> Result<TransitionOutcome> {
    state.board.move_task(task_id, status).await
}

// ===== Tasks =====

#[tauri::command]
pub async fn quick_add_task(state: State<'_, AppState>, title: String) -> Result<Task> {
    state.board.quick_add_task(&title).await
}

#[tauri::command]
pub async fn open_task(state: State<'_, AppState>, task_id: TaskId) -> Result<Task> {
    state.board.open_task(task_id).await
}

#[tauri::command]
pub async fn update_task(state: State<'_, AppState>, task_id: TaskId, edit: TaskEdit) -> Result<Task> {
    state.board.update_task(task_id, edit).await
}

#[tauri::command]
pub async fn delete_task(state: State<'_, AppState>, task_id: TaskId) -> Result<()> {
    state.board.delete_task(task_id).await
}

// ===== Checklist =====

#[tauri::command]
pub async fn add_checklist_item(state: State<'_, AppState>, task_id: TaskId, text: String) -> Result<Task> {
    state.board.add_checklist_item(task_id, &text).await
}

#[tauri::command]
pub async fn update_checklist_item(
    state: State<'_, AppState>,
    task_id: TaskId,
    item_id: ChecklistItemId,
    changes: UpdateChecklistItemRequest,
) -> Result<Task> {
    state.board.update_checklist_item(task_id, item_id, changes).await
}

#[tauri::command]
pub async fn toggle_checklist_item(
    state: State<'_, AppState>,
    task_id: TaskId,
    item_id: ChecklistItemId,
) -> Result<Task> {
    state.board.toggle_checklist_item(task_id, item_id).await
}

#[tauri::command]
pub async fn delete_checklist_item(
    state: State<'_, AppState>,
    task_id: TaskId,
    item_id: ChecklistItemId,
) -> Result<Task> {
    state.board.delete_checklist_item(task_id, item_id).await
}

// ===== Comments =====

#[tauri::command]
pub async fn add_comment(
    state: State<'_, AppState>,
    task_id: TaskId,
    text: String,
    author_name: Option<String>,
) -> Result<Task> {
    state
        .board
        .add_comment(task_id, &text, author_name.as_deref())
        .await
}

#[tauri::command]
pub async fn update_comment(
    state: State<'_, AppState>,
    task_id: TaskId,
    comment_id: CommentId,
    text: String,
) -> Result<Task> {
    state.board.update_comment(task_id, comment_id, &text).await
}

#[tauri::command]
pub async fn delete_comment(
    state: State<'_, AppState>,
    task_id: TaskId,
    comment_id: CommentId,
) -> Result<Task> {
    state.board.delete_comment(task_id, comment_id).await
}

async fn board_view(state: &AppState) -> BoardView {
    BoardView {
        status: state.board.status().await,
        project: state.board.snapshot().await,
        columns: state.board.columns().await,
    }
}
