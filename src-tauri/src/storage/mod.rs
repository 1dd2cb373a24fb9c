//! Storage module
//!
//! Provides the persisted key-value store backing local-only client state
//! (bookmarked projects, the dev-mode flag).

pub mod kv_store;

pub use kv_store::KvStore;
