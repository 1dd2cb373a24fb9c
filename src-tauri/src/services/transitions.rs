//! Kanban status transitions
//!
//! Checklist-gated rules deciding whether a task may move to another
//! column, and resolution of drag-and-drop targets into a status.
//!
//! The rules are asymmetric and depend on the checklist, not on the
//! current status:
//!
//! | target | permitted when |
//! |--------|----------------|
//! | DONE   | no checklist, or every item checked |
//! | TODO   | no checklist, or at least one item unchecked |
//! | DOING  | always |

use crate::api::{Progress, Task, TaskId, TaskStatus};
use serde::Serialize;
use thiserror::Error;

/// Why a status change was refused
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum TransitionError {
    #[error("Complete the checklist before moving to DONE ({done}/{total} items checked)")]
    ChecklistIncomplete { done: usize, total: usize },

    #[error("The checklist is complete; uncheck an item before moving back to TODO")]
    ChecklistComplete { total: usize },

    #[error("Unknown target status: {0}")]
    UnknownStatus(String),
}

/// Decide whether a task with the given checklist progress may enter `target`
pub fn validate_transition(
    progress: Progress,
    target: TaskStatus,
) -> Result<(), TransitionError> {
    let Progress { done, total } = progress;

    match target {
        TaskStatus::Done if total > 0 && done < total => {
            Err(TransitionError::ChecklistIncomplete { done, total })
        }
        TaskStatus::Todo if total > 0 && done == total => {
            Err(TransitionError::ChecklistComplete { total })
        }
        _ => Ok(()),
    }
}

pub fn check_task(task: &Task, target: TaskStatus) -> Result<(), TransitionError> {
    validate_transition(task.checklist_progress(), target)
}

/// What a dragged card was dropped onto
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A column, identified by its status
    Column(TaskStatus),
    /// Another card; the dragged task takes that card's status
    Task(TaskId),
    Unknown(String),
}

impl DropTarget {
    /// Interpret a droppable identifier: column ids are status names,
    /// card ids are numeric task ids
    pub fn parse(raw: &str) -> Self {
        if let Ok(status) = raw.parse::<TaskStatus>() {
            return DropTarget::Column(status);
        }
        match raw.trim().parse::<TaskId>() {
            Ok(id) => DropTarget::Task(id),
            Err(_) => DropTarget::Unknown(raw.to_string()),
        }
    }
}

/// End of a drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub task_id: TaskId,
    /// `None` when the card was released outside any droppable
    pub over: Option<DropTarget>,
}

impl DragEnd {
    pub fn new(task_id: TaskId, over: Option<DropTarget>) -> Self {
        Self { task_id, over }
    }

    pub fn onto_column(task_id: TaskId, status: TaskStatus) -> Self {
        Self::new(task_id, Some(DropTarget::Column(status)))
    }

    pub fn onto_task(task_id: TaskId, other: TaskId) -> Self {
        Self::new(task_id, Some(DropTarget::Task(other)))
    }
}

/// Result of handling a status change request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum TransitionOutcome {
    /// Dropped outside any target, or onto a card that no longer exists
    NoTarget,
    /// Target status equals the current one
    Unchanged,
    Rejected(TransitionError),
    /// Persisted and reconciled with the backend's copy
    Applied(Task),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(done: usize, total: usize) -> Progress {
        Progress { done, total }
    }

    #[test]
    fn test_empty_checklist_permits_every_status() {
        for target in TaskStatus::ALL {
            assert_eq!(validate_transition(progress(0, 0), target), Ok(()));
        }
    }

    #[test]
    fn test_done_requires_complete_checklist() {
        for total in 1..5 {
            for done in 0..=total {
                let result = validate_transition(progress(done, total), TaskStatus::Done);
                if done == total {
                    assert_eq!(result, Ok(()));
                } else {
                    assert_eq!(result, Err(TransitionError::ChecklistIncomplete { done, total }));
                }
            }
        }
    }

    #[test]
    fn test_todo_locked_once_checklist_complete() {
        assert_eq!(
            validate_transition(progress(3, 3), TaskStatus::Todo),
            Err(TransitionError::ChecklistComplete { total: 3 })
        );
        assert_eq!(validate_transition(progress(2, 3), TaskStatus::Todo), Ok(()));
        assert_eq!(validate_transition(progress(0, 3), TaskStatus::Todo), Ok(()));
    }

    #[test]
    fn test_doing_always_permitted() {
        for (done, total) in [(0, 0), (0, 2), (1, 2), (2, 2)] {
            assert_eq!(validate_transition(progress(done, total), TaskStatus::Doing), Ok(()));
        }
    }

    #[test]
    fn test_drop_target_parsing() {
        assert_eq!(DropTarget::parse("DONE"), DropTarget::Column(TaskStatus::Done));
        assert_eq!(DropTarget::parse("42"), DropTarget::Task(42));
        assert_eq!(
            DropTarget::parse("backlog"),
            DropTarget::Unknown("backlog".to_string())
        );
    }
}
