use super::{build_engine, write_project};
use crate::render::render_events;
use anyhow::Result;
use colored::Colorize;
use sf_core::engine::EngineError;
use sf_core::state::ProjectManager;
use sf_protocol::project_models::{Theme, MAIN_FILE};
use std::path::PathBuf;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;

pub struct RunArgs {
    pub prompt: String,
    pub theme: Theme,
    pub dir: PathBuf,
    pub out: Option<PathBuf>,
    pub stream: bool,
}

pub async fn execute(args: RunArgs) -> Result<bool> {
    let (config, engine) = build_engine(&args.dir, args.stream).await?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let renderer = tokio::spawn(render_events(events_rx, args.stream));
    let manager = ProjectManager::new(engine, events_tx);

    let result = manager.run_project(&args.prompt, args.theme).await;
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

    let out = args.out.unwrap_or_else(|| {
        config
            .factory_dir()
            .join("projects")
            .join(format!("{}.json", project.id))
    });
    write_project(&project, &out)?;

    let lines = project
        .code
        .as_ref()
        .and_then(|code| code.files.get(MAIN_FILE))
        .map_or(0, |source| source.lines().count());
    println!(
        "\n{} {} ({MAIN_FILE}: {lines} lines)",
        "Saved".green().bold(),
        out.display()
    );
    Ok(true)
}
