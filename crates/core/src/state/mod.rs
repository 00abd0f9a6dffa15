//! State management for projects.
//!
//! This module provides:
//! - Project state machine logic
//! - ProjectManager for starting and modifying projects

pub mod manager;
pub mod project;

pub use manager::ProjectManager;
