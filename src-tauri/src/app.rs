//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::api::{ApiClient, ProjectBackend};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::events::{EventBus, UiEvent};
use crate::services::{
    BoardController, BookmarkStore, DashboardController, DevModeGate, ProjectsService,
};
use crate::storage::KvStore;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub events: Arc<EventBus>,
    pub store: Arc<KvStore>,
    pub bookmarks: Arc<BookmarkStore>,
    pub dev_mode: Arc<DevModeGate>,
    pub projects: Arc<ProjectsService>,
    pub dashboard: Arc<DashboardController>,
    pub board: Arc<BoardController>,
    listeners: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AppState {
    /// Build the state against the HTTP backend named in `config`
    pub fn initialize(config: ClientConfig) -> Result<Self> {
        let client = ApiClient::from_config(&config)?;
        tracing::info!("Using backend at {}", client.base_url());
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    pub fn with_backend(config: ClientConfig, backend: Arc<dyn ProjectBackend>) -> Self {
        let events = Arc::new(EventBus::new());
        let store = Arc::new(KvStore::open(config.storage_path()));
        let bookmarks = Arc::new(BookmarkStore::new(store.clone(), events.clone()));
        let dev_mode = Arc::new(DevModeGate::new(
            store.clone(),
            events.clone(),
            config.dev_passphrase.clone(),
        ));
        let projects = Arc::new(ProjectsService::new(
            backend.clone(),
            bookmarks.clone(),
            events.clone(),
        ));
        let dashboard = Arc::new(DashboardController::new(
            projects.clone(),
            bookmarks.clone(),
            dev_mode.clone(),
            events.clone(),
        ));
        let board = Arc::new(BoardController::new(backend, events.clone()));

        Self {
            config: Arc::new(config),
            events,
            store,
            bookmarks,
            dev_mode,
            projects,
            dashboard,
            board,
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn the listener that reloads the dashboard on project changes
    pub fn start_listeners(&self, runtime: &Handle) {
        let mut rx = self.events.subscribe();
        let dashboard = self.dashboard.clone();

        let handle = runtime.spawn(async move {
            tracing::info!("Starting dashboard listener");
            loop {
                match rx.recv().await {
                    Ok(UiEvent::ProjectsChanged) | Ok(UiEvent::DashboardRefresh) => {
                        if let Err(e) = dashboard.load_projects().await {
                            tracing::error!("Dashboard refresh failed: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dashboard listener lagged, skipped {} events", skipped);
                        if let Err(e) = dashboard.load_projects().await {
                            tracing::error!("Dashboard refresh failed: {}", e);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.track(handle);
    }

    /// Pass every published event to `sink`, e.g. the webview emitter
    pub fn forward_events<F>(&self, runtime: &Handle, sink: F)
    where
        F: Fn(&UiEvent) + Send + 'static,
    {
        let mut rx = self.events.subscribe();

        let handle = runtime.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => sink(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Event forwarder lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.track(handle);
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().iter().filter(|h| !h.is_finished()).count()
    }

    /// Stop every background listener
    pub fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = self.lock_listeners().drain(..).collect();
        tracing::info!("Shutting down {} listener(s)", handles.len());
        for handle in handles {
            handle.abort();
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.lock_listeners().push(handle);
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projetei=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Application setup - called once on startup
#[cfg(feature = "desktop")]
pub fn setup(app: &mut tauri::App) -> Result<()> {
    use tauri::{Emitter, Manager};

    tracing::info!("Initializing application");

    let mut config = ClientConfig::from_env();
    if std::env::var_os("PROJETEI_DATA_DIR").is_none() {
        config.data_dir = app.path().app_data_dir().map_err(|e| {
            crate::error::AppError::Generic(format!("Failed to get app data dir: {}", e))
        })?;
    }

    tracing::info!("App data directory: {:?}", config.data_dir);
    std::fs::create_dir_all(&config.data_dir)?;

    let state = AppState::initialize(config)?;
    let runtime = tauri::async_runtime::handle();
    state.start_listeners(runtime.inner());

    let handle = app.handle().clone();
    state.forward_events(runtime.inner(), move |event| {
        if let Err(e) = handle.emit(event.name(), event) {
            tracing::error!("Failed to emit {}: {}", event.name(), e);
        }
    });

    app.manage(state);

    tracing::info!("Application initialized successfully");

    Ok(())
}
