//! Dev-mode gate
//!
//! Convenience toggle that unlocks the "all projects" dashboard view. It is
//! switched on by typing the configured passphrase into the search field and
//! off by typing `dev:off`. This is not a security boundary.
//!
//! Without a configured passphrase dev mode can never be enabled, even if a
//! flag was persisted earlier.

use crate::config::{DEV_MODE_KEY, DEV_MODE_OFF_TOKEN};
use crate::error::Result;
use crate::events::{EventBus, UiEvent};
use crate::storage::KvStore;
use serde::Serialize;
use std::sync::Arc;

/// Effect of a recognised dev-mode token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DevModeChange {
    On,
    Off,
}

pub struct DevModeGate {
    store: Arc<KvStore>,
    events: Arc<EventBus>,
    passphrase: Option<String>,
}

impl DevModeGate {
    pub fn new(store: Arc<KvStore>, events: Arc<EventBus>, passphrase: Option<String>) -> Self {
        let passphrase = passphrase.filter(|p| !p.is_empty());
        if passphrase.is_none() {
            tracing::info!("Dev mode disabled: no passphrase configured");
        }
        Self {
            store,
            events,
            passphrase,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.passphrase.is_some() && self.store.get(DEV_MODE_KEY).as_deref() == Some("1")
    }

    pub fn activate(&self) -> Result<bool> {
        if self.passphrase.is_none() {
            return Ok(false);
        }
        self.store.set(DEV_MODE_KEY, "1")?;
        tracing::info!("Dev mode enabled");
        self.events.publish(UiEvent::DevModeChanged { enabled: true });
        self.events.publish(UiEvent::info("Developer mode enabled."));
        Ok(true)
    }

    pub fn deactivate(&self) -> Result<()> {
        self.store.remove(DEV_MODE_KEY)?;
        tracing::info!("Dev mode disabled");
        self.events.publish(UiEvent::DevModeChanged { enabled: false });
        self.events.publish(UiEvent::info("Developer mode disabled."));
        Ok(())
    }

    /// Interpret a search-field token. Returns `None` for anything that is
    /// not a dev-mode command, so the caller can treat it as a search.
    pub fn try_token(&self, token: &str) -> Result<Option<DevModeChange>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        if token.eq_ignore_ascii_case(DEV_MODE_OFF_TOKEN) {
            self.deactivate()?;
            return Ok(Some(DevModeChange::Off));
        }

        match &self.passphrase {
            Some(pass) if token == pass => {
                self.activate()?;
                Ok(Some(DevModeChange::On))
            }
            _ => Ok(None),
        }
    }
}
