//! # sf-protocol
//!
//! Core protocol definitions and data models for sdlc-factory.
//!
//! This crate defines all shared data structures used for:
//! - Project state and the per-stage structured results
//! - Configuration file parsing (TOML global config, agent front matter)
//! - Chat transcript and history snapshots
//! - Inter-process communication between a front end and Core
//!
//! ## Modules
//!
//! - [`project_models`]: Project, stages and stage results
//! - [`agent_models`]: Stage agent profiles from `agents/*.md`
//! - [`config_models`]: Global configuration from config.toml
//! - [`message_models`]: Agent transcript messages
//! - [`history_models`]: Saved project snapshots
//! - [`ipc`]: Operations and Events for front end/Core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, chrono and uuid, plus ts-rs so the
//!   front end can share the project and event types
//! - Independent compilation: no dependencies on other sdlc-factory crates

pub mod agent_models;
pub mod config_models;
pub mod history_models;
pub mod ipc;
pub mod message_models;
pub mod project_models;

// Re-export all public types for convenience
pub use agent_models::*;
pub use config_models::*;
pub use history_models::*;
pub use ipc::*;
pub use message_models::*;
pub use project_models::*;
