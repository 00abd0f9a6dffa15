use super::{build_engine, write_project};
use crate::render::render_events;
use anyhow::{Context, Result};
use colored::Colorize;
use sf_core::engine::EngineError;
use sf_core::state::ProjectManager;
use sf_protocol::project_models::Project;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub async fn execute(
    project_json: PathBuf,
    request: String,
    dir: PathBuf,
    out: Option<PathBuf>,
) -> Result<bool> {
    let content = std::fs::read_to_string(&project_json)
        .with_context(|| format!("failed to read {}", project_json.display()))?;
    let project: Project = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a project file", project_json.display()))?;

    let (_, engine) = build_engine(&dir, true).await?;
    let (events_tx, events_rx) = mpsc::channel(256);
    let renderer = tokio::spawn(render_events(events_rx, true));
    let manager = ProjectManager::new(engine, events_tx);

    let id = manager.register(project).await;
    let result = manager.modify_project(id, &request).await;
    drop(manager);
    let _ = renderer.await;

    let project = match result {
        Ok(project) => project,
        Err(EngineError::Stage { stage, source }) => {
            eprintln!("{} {stage} stage failed: {source}", "error:".red().bold());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let out = out.unwrap_or(project_json);
    write_project(&project, &out)?;
    println!("\n{} {}", "Saved".green().bold(), out.display());
    Ok(true)
}
