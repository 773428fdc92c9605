//! patchkeeper
//!
//! Configuration persistence for a software synthesizer:
//!
//! - [`settings`]: hierarchical key/value store over a flat backend (sled)
//! - [`config`]: application options, preset registry, bank/program catalog
//!   and controller mappings persisted in the settings store
//! - [`programs`] / [`controls`]: the in-memory catalogs
//! - [`preset`]: preset files
//! - [`session`]: save/restore requests from an external session manager
//! - [`app`]: the event loop tying it together

pub mod app;
pub mod cli;
pub mod config;
pub mod controls;
pub mod error;
pub mod paths;
pub mod preset;
pub mod programs;
pub mod session;
pub mod settings;

/// Organization domain, used for the settings location
pub const APP_DOMAIN: &str = "patchkeeper.org";
/// Application title, also the session preset file extension
pub const APP_TITLE: &str = "patchkeeper";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
