//! Initialization module for creating `.sdlc-factory` directory structures.
//!
//! This module writes the built-in configuration into a project so it can
//! be edited:
//! - Global configuration (`config.toml`)
//! - One agent profile per stage (`agents/*.md`)
//!
//! # Example
//!
//! ```no_run
//! use sf_core::init::{generate_factory_structure, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//! };
//!
//! let written = generate_factory_structure(options).await?;
//! println!("Wrote {} files", written.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_factory_structure, InitOptions};
pub use templates::{get_template, list_templates};
