use anyhow::{Context, Result};
use colored::Colorize;
use sf_core::config::load_config;
use sf_core::storage::{FileHistoryStore, HistoryStore};
use std::path::PathBuf;

pub async fn execute(dir: PathBuf) -> Result<bool> {
    let config = load_config(&dir).await?;
    let store = FileHistoryStore::new(config.history_path(), config.global.history_limit);
    let items = store
        .list()
        .await
        .with_context(|| format!("failed to read {}", store.path().display()))?;

    if items.is_empty() {
        println!("No saved projects.");
        return Ok(true);
    }

    for item in items {
        println!(
            "{}  {}  {:?}  {}",
            item.timestamp.format("%Y-%m-%d %H:%M"),
            item.name.bold(),
            item.project.status,
            item.id.to_string().dimmed()
        );
        println!("    {}", item.preview);
    }
    Ok(true)
}
