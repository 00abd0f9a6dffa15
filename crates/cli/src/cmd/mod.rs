//! Subcommand implementations.
//!
//! Each `execute` returns `Ok(false)` when the command ran but the project
//! failed, so the binary can exit non-zero without an error report.

pub mod history;
pub mod init;
pub mod modify;
pub mod run;

use anyhow::{Context, Result};
use sf_core::config::{load_config, AppConfig};
use sf_core::engine::PipelineEngine;
use sf_core::gateway::GatewayFactory;
use sf_core::storage::FileHistoryStore;
use sf_protocol::project_models::Project;
use std::path::Path;
use std::sync::Arc;

/// Load configuration and build an engine that records history on disk.
async fn build_engine(dir: &Path, stream: bool) -> Result<(AppConfig, PipelineEngine)> {
    let config = load_config(dir)
        .await
        .with_context(|| format!("failed to load configuration from {}", dir.display()))?;
    let gateway =
        GatewayFactory::create(&config.global).context("failed to create the model gateway")?;
    let history = Arc::new(FileHistoryStore::new(
        config.history_path(),
        config.global.history_limit,
    ));
    tracing::info!(provider = %config.global.provider, "gateway ready");

    let engine = PipelineEngine::new(gateway, &config)
        .with_history(history)
        .with_streaming(stream);
    Ok((config, engine))
}

fn write_project(project: &Project, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(project).context("failed to serialize project")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
