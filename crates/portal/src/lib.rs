//! `hrportal-portal`
//!
//! **Responsibility:** the HR portal shell around the identity core.
//!
//! This crate provides:
//! - Static portal configuration (navigation, route role gates, seeded directory)
//! - SQLite session persistence for native tooling
//! - The Leptos web frontend (wasm32 only)

pub mod config;

#[cfg(not(target_arch = "wasm32"))]
pub mod session_db;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

pub use config::{HOME_PATH, NAVIGATION, seeded_directory};

#[cfg(not(target_arch = "wasm32"))]
pub use config::PortalConfig;
#[cfg(not(target_arch = "wasm32"))]
pub use session_db::SqliteSessionBackend;
