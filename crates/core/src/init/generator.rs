//! Directory structure and file generation for `.sdlc-factory` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::FACTORY_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a `.sdlc-factory` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.sdlc-factory` will be created.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.sdlc-factory` directory.
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
        }
    }
}

/// Generate a `.sdlc-factory` directory populated with the built-in
/// configuration.
///
/// This function creates the following structure:
/// ```text
/// .sdlc-factory/
/// ├── config.toml
/// └── agents/
///     ├── naming.md
///     ├── requirement.md
///     ├── design.md
///     ├── development.md
///     ├── testing.md
///     └── modification.md
/// ```
///
/// # Returns
/// The paths written, or an `InitError` if:
/// - The directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_factory_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let factory_dir = options.target_dir.join(FACTORY_DIR);

    if factory_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(factory_dir));
    }

    let agents_dir = factory_dir.join("agents");
    fs::create_dir_all(&agents_dir).map_err(|source| InitError::DirectoryCreate {
        path: agents_dir.clone(),
        source,
    })?;

    let mut written = vec![write_template_file(&factory_dir, "config.toml")?];
    for agent_path in list_templates("agents/") {
        written.push(write_template_file(&factory_dir, &agent_path)?);
    }

    tracing::info!(
        dir = %factory_dir.display(),
        files = written.len(),
        "initialized factory directory"
    );
    Ok(written)
}

fn write_template_file(factory_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = factory_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}
