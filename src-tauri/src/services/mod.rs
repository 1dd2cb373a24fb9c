//! Services module
//!
//! Controllers that coordinate between commands, the backend and local storage.

pub mod board;
pub mod bookmarks;
pub mod dashboard;
pub mod dev_mode;
pub mod projects;
pub mod transitions;

pub use board::{BoardColumns, BoardController, BoardStatus, TaskEdit};
pub use bookmarks::{BookmarkRecord, BookmarkStore};
pub use dashboard::{DashboardController, FilterMode, SearchOutcome};
pub use dev_mode::{DevModeChange, DevModeGate};
pub use projects::ProjectsService;
pub use transitions::{DragEnd, DropTarget, TransitionError, TransitionOutcome};
