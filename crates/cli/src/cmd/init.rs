use anyhow::Result;
use colored::Colorize;
use sf_core::init::{generate_factory_structure, InitOptions};
use std::path::PathBuf;

pub async fn execute(dir: PathBuf, force: bool) -> Result<bool> {
    let written = generate_factory_structure(InitOptions {
        target_dir: dir,
        force,
    })
    .await?;

    println!("{}", "Initialized .sdlc-factory".green().bold());
    for path in written {
        println!("  {}", path.display());
    }
    Ok(true)
}
