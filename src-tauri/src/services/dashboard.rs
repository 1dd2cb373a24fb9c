//! Dashboard service
//!
//! Derives the visible project grid from the full project list, the filter
//! mode, the name search and the bookmark set, and routes whatever the user
//! types into the header search field.

use crate::api::Project;
use crate::config::CODE_LOOKUP_MIN_LEN;
use crate::error::Result;
use crate::events::{EventBus, UiEvent};
use crate::services::bookmarks::BookmarkStore;
use crate::services::dev_mode::{DevModeChange, DevModeGate};
use crate::services::projects::ProjectsService;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which projects the grid shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    All,
    #[default]
    Mine,
}

/// What a header search submission turned into
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SearchOutcome {
    Cleared,
    DevMode(DevModeChange),
    /// The input was a project code; the lookup modal was opened
    Lookup(Project),
    /// Name search applied; number of visible projects
    Name { matches: usize },
}

/// Whether a search token should be tried as a project code
pub fn looks_like_code(token: &str) -> bool {
    token.chars().count() >= CODE_LOOKUP_MIN_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Apply the filter mode and the name search to a project list
pub fn filter_projects(
    projects: &[Project],
    mode: FilterMode,
    bookmark_keys: &HashSet<String>,
    query: &str,
) -> Vec<Project> {
    let needle = query.trim().to_lowercase();

    projects
        .iter()
        .filter(|p| match mode {
            FilterMode::All => true,
            FilterMode::Mine => {
                let code = p.code.trim();
                (!code.is_empty() && bookmark_keys.contains(code))
                    || bookmark_keys.contains(&p.id.to_string())
            }
        })
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Inputs the visible list was last derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeriveKey {
    bookmarks_version: u64,
    dev_mode: bool,
}

#[derive(Default)]
struct DashboardState {
    projects: Vec<Project>,
    filter: FilterMode,
    search: String,
    last_notified_query: Option<String>,
    visible: Vec<Project>,
    derived_from: Option<DeriveKey>,
}

/// Dashboard Filter Controller
pub struct DashboardController {
    projects: Arc<ProjectsService>,
    bookmarks: Arc<BookmarkStore>,
    dev_mode: Arc<DevModeGate>,
    events: Arc<EventBus>,
    state: Mutex<DashboardState>,
}

impl DashboardController {
    pub fn new(
        projects: Arc<ProjectsService>,
        bookmarks: Arc<BookmarkStore>,
        dev_mode: Arc<DevModeGate>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            projects,
            bookmarks,
            dev_mode,
            events,
            state: Mutex::new(DashboardState::default()),
        }
    }

    /// Refetch the project list from the backend
    pub async fn load_projects(&self) -> Result<usize> {
        match self.projects.list_projects().await {
            Ok(projects) => {
                let count = projects.len();
                tracing::debug!("Dashboard loaded {} projects", count);
                self.set_projects(projects).await;
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Failed to load projects: {}", e);
                self.set_projects(Vec::new()).await;
                self.events.publish(UiEvent::error("Could not load projects."));
                Err(e)
            }
        }
    }

    pub async fn set_projects(&self, projects: Vec<Project>) {
        let mut state = self.state.lock().await;
        state.projects = projects;
        self.derive(&mut state);
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.lock().await.projects.clone()
    }

    pub async fn set_filter(&self, mode: FilterMode) {
        let mut state = self.state.lock().await;
        state.filter = mode;
        self.derive(&mut state);
    }

    /// Requested filter mode
    pub async fn filter(&self) -> FilterMode {
        self.state.lock().await.filter
    }

    /// Mode actually applied: `All` needs dev mode
    pub fn effective_filter(&self, requested: FilterMode) -> FilterMode {
        if self.dev_mode.is_enabled() {
            requested
        } else {
            FilterMode::Mine
        }
    }

    pub async fn search(&self) -> String {
        self.state.lock().await.search.clone()
    }

    /// Apply a name search and return the number of visible projects
    pub async fn search_by_name(&self, query: &str) -> usize {
        let mut state = self.state.lock().await;
        state.search = query.trim().to_string();
        if state.search.is_empty() {
            state.last_notified_query = None;
        }
        self.derive(&mut state);
        state.visible.len()
    }

    pub async fn clear_search(&self) {
        self.search_by_name("").await;
    }

    /// Back to the bookmarked projects with no search
    pub async fn show_my_projects(&self) {
        {
            let mut state = self.state.lock().await;
            state.filter = FilterMode::Mine;
            state.search.clear();
            state.last_notified_query = None;
            self.derive(&mut state);
        }
        self.events.publish(UiEvent::ShowMyProjects);
    }

    /// The current grid, re-derived first if bookmarks or dev mode changed
    pub async fn visible(&self) -> Vec<Project> {
        let mut state = self.state.lock().await;
        if state.derived_from != Some(self.derive_key()) {
            self.derive(&mut state);
        }
        state.visible.clone()
    }

    /// Route a header search submission
    pub async fn submit_search(&self, input: &str) -> Result<SearchOutcome> {
        let input = input.trim();
        if input.is_empty() {
            self.clear_search().await;
            return Ok(SearchOutcome::Cleared);
        }

        if let Some(change) = self.dev_mode.try_token(input)? {
            self.clear_search().await;
            return Ok(SearchOutcome::DevMode(change));
        }

        if looks_like_code(input) {
            match self.projects.lookup_by_code(input).await {
                Ok(project) => return Ok(SearchOutcome::Lookup(project)),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No project with code {}, searching by name", input);
                }
                Err(e) => {
                    tracing::warn!("Code lookup for {} failed: {}", input, e);
                }
            }
        }

        self.events.publish(UiEvent::SearchByName {
            query: input.to_string(),
        });
        let matches = self.search_by_name(input).await;
        Ok(SearchOutcome::Name { matches })
    }

    fn derive_key(&self) -> DeriveKey {
        DeriveKey {
            bookmarks_version: self.bookmarks.version(),
            dev_mode: self.dev_mode.is_enabled(),
        }
    }

    fn derive(&self, state: &mut DashboardState) {
        let key = self.derive_key();
        let mode = self.effective_filter(state.filter);
        let bookmark_keys = self.bookmarks.keys();

        state.visible = filter_projects(&state.projects, mode, &bookmark_keys, &state.search);
        state.derived_from = Some(key);

        if state.search.is_empty() {
            return;
        }
        if !state.visible.is_empty() {
            state.last_notified_query = None;
            return;
        }
        if state.last_notified_query.as_deref() == Some(state.search.as_str()) {
            return;
        }

        tracing::debug!("No project matches '{}'", state.search);
        self.events
            .publish(UiEvent::info(format!("No project found matching \"{}\".", state.search)));
        state.last_notified_query = Some(state.search.clone());
    }
}
