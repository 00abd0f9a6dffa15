//! Configuration loading and management.
//!
//! This module loads the `.sdlc-factory/` directory: the global
//! `config.toml`, per-stage agent profiles from `agents/*.md`, and the
//! environment overrides layered on top. Built-in profiles fill every stage
//! the directory does not define.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_with_env};
pub use models::{AgentProfiles, AppConfig, FACTORY_DIR};
