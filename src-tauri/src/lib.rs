//! Projetei library
//!
//! Client core of the Projetei project tracker: the board and dashboard
//! controllers, local bookmarks, the dev-mode gate and the REST client.
//! The desktop shell (feature `desktop`) exposes them as Tauri commands.

pub mod api;
pub mod app;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod storage;
