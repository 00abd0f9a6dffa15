//! Embedded template files for `.sdlc-factory` initialization.
//!
//! This module uses `rust-embed` to embed the crate's `templates/` directory
//! into the binary at compile time. The same files are the built-in
//! configuration used when a project has no `.sdlc-factory/` of its own.

use rust_embed::RustEmbed;

/// Embedded template files from the crate's `templates/` directory.
///
/// With the `debug-embed` feature the files are embedded in debug builds
/// too, so tests see exactly what a release binary ships.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/templates"]
pub struct TemplateAssets;

/// Get template file content by path.
///
/// # Arguments
/// * `path` - Relative path from templates root (e.g., "config.toml", "agents/design.md")
///
/// # Returns
/// The file content as a String, or None if the file doesn't exist.
///
/// # Example
/// ```
/// use sf_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("provider ="));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files under a prefix, sorted.
///
/// # Example
/// ```
/// use sf_core::init::templates::list_templates;
///
/// let agents = list_templates("agents/");
/// assert!(agents.contains(&"agents/requirement.md".to_string()));
/// ```
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
