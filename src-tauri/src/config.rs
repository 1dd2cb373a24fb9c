//! Application configuration
//!
//! Central location for configuration constants, storage keys, defaults
//! and the environment-driven client configuration.

use std::path::PathBuf;
use std::time::Duration;

// ===== Backend =====

/// Backend origin used when `PROJETEI_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8081";

/// Path prefix under which every REST resource lives
pub const API_PREFIX: &str = "/api";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every backend request
pub const USER_AGENT: &str = concat!("projetei/", env!("CARGO_PKG_VERSION"));

// ===== Local Storage =====

/// File name of the persisted key-value store inside the data directory
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Key holding the JSON-encoded bookmark list
pub const MY_PROJECTS_KEY: &str = "projetei.myProjects";

/// Key holding the dev-mode flag ("1" when enabled)
pub const DEV_MODE_KEY: &str = "projetei.devMode";

// ===== Dev Mode =====

/// Passphrase used when `PROJETEI_DEV_PASS` is unset.
/// Setting the variable to an empty string disables dev mode entirely.
pub const DEFAULT_DEV_PASSPHRASE: &str = "projetaidev";

/// Literal token (case-insensitive) that switches dev mode off
pub const DEV_MODE_OFF_TOKEN: &str = "dev:off";

// ===== Search =====

/// Minimum length for a search token to be treated as a project code
pub const CODE_LOOKUP_MIN_LEN: usize = 4;

// ===== Tasks & Comments =====

/// Author recorded on comments when the caller does not supply one
pub const DEFAULT_COMMENT_AUTHOR: &str = "Anonymous";

// ===== Events =====

/// Capacity of the UI event broadcast channel
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Client configuration resolved at startup
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fully-qualified API root, e.g. `http://localhost:8081/api`
    pub api_base_url: String,
    /// `None` permanently disables dev-mode activation
    pub dev_passphrase: Option<String>,
    pub request_timeout: Duration,
    /// Where the key-value store lives; the desktop shell overrides this
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: api_root(DEFAULT_API_URL),
            dev_passphrase: Some(DEFAULT_DEV_PASSPHRASE.to_string()),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    /// Build configuration from `PROJETEI_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("PROJETEI_API_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| api_root(&v))
            .unwrap_or(defaults.api_base_url);

        let dev_passphrase = match lookup("PROJETEI_DEV_PASS") {
            Some(pass) if pass.is_empty() => None,
            Some(pass) => Some(pass),
            None => defaults.dev_passphrase,
        };

        let request_timeout = lookup("PROJETEI_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let data_dir = lookup("PROJETEI_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        Self {
            api_base_url,
            dev_passphrase,
            request_timeout,
            data_dir,
        }
    }

    /// Path of the persisted key-value store
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE_NAME)
    }
}

/// Append the API prefix to a backend origin
fn api_root(origin: &str) -> String {
    format!("{}{}", origin.trim().trim_end_matches('/'), API_PREFIX)
}

fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
        .join(".projetei")
}
