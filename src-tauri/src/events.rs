//! UI event bus
//!
//! Typed, in-process publish/subscribe for cross-component notifications
//! (projects changed, toasts, modal requests, dev-mode changes). Nothing
//! here is persisted or sent over the network; the desktop shell forwards
//! events to the webview using [`UiEvent::name`] as the event name.

use crate::api::Project;
use crate::config::EVENT_BUS_CAPACITY;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Severity of a transient user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// A notification published on the bus
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    /// The project list or the bookmark list changed
    ProjectsChanged,
    /// Switch the dashboard to the bookmarked projects
    ShowMyProjects,
    /// A name search was submitted
    #[serde(rename_all = "camelCase")]
    SearchByName { query: String },
    /// Show the lookup modal for a project found by code
    #[serde(rename_all = "camelCase")]
    OpenProjectLookup { project: Box<Project> },
    /// Show the details modal for a project
    #[serde(rename_all = "camelCase")]
    OpenProjectDetails { project_id: i64 },
    /// Transient user-facing message
    #[serde(rename_all = "camelCase")]
    Toast { message: String, level: ToastLevel },
    #[serde(rename_all = "camelCase")]
    DevModeChanged { enabled: bool },
    /// Ask the dashboard to refetch the project list
    DashboardRefresh,
    /// The board snapshot changed and should be re-rendered
    #[serde(rename_all = "camelCase")]
    BoardUpdated { project_code: Option<String> },
}

impl UiEvent {
    /// Event name used when forwarding to the frontend
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::ProjectsChanged => "projects:changed",
            UiEvent::ShowMyProjects => "projects:show-mine",
            UiEvent::SearchByName { .. } => "projects:search-name",
            UiEvent::OpenProjectLookup { .. } => "project:open-modal",
            UiEvent::OpenProjectDetails { .. } => "project:open-details",
            UiEvent::Toast { .. } => "ui:toast",
            UiEvent::DevModeChanged { .. } => "devmode:changed",
            UiEvent::DashboardRefresh => "dashboard:refresh",
            UiEvent::BoardUpdated { .. } => "board:updated",
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        UiEvent::Toast {
            message: message.into(),
            level: ToastLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        UiEvent::Toast {
            message: message.into(),
            level: ToastLevel::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        UiEvent::Toast {
            message: message.into(),
            level: ToastLevel::Error,
        }
    }
}

/// Broadcast-based event bus.
///
/// `publish` never awaits. Receivers that fall behind by more than the
/// channel capacity observe a lag error instead of blocking publishers.
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
    published: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: UiEvent) -> usize {
        tracing::debug!("Publishing UI event: {}", event.name());
        self.published.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain every event currently queued on a receiver
pub fn drain(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Event receiver lagged, skipped {} events", skipped);
            }
            Err(_) => break,
        }
    }
    events
}
