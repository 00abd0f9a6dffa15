//! Command-line driver for sdlc-factory.
//!
//! Wires logging, loads `.sdlc-factory/` configuration, builds the model
//! gateway and drives a single project run or modification while rendering
//! the event feed to the terminal.

mod cmd;
mod logging;
mod render;

use clap::{Parser, Subcommand};
use sf_protocol::project_models::Theme;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "factory")]
#[command(version, about = "Turn a one-line idea into a React app through staged LLM agents")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .sdlc-factory directory with the built-in configuration
    Init {
        /// Project root to initialize
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing .sdlc-factory directory
        #[arg(long)]
        force: bool,
    },
    /// Run the full pipeline for a prompt
    Run {
        /// What to build, e.g. "A todo app"
        prompt: String,

        /// Visual theme: ocean, sunset or forest
        #[arg(long, default_value = "ocean")]
        theme: Theme,

        /// Project root holding .sdlc-factory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Where to write the project JSON
        #[arg(long)]
        out: Option<PathBuf>,

        /// Request whole replies instead of streamed fragments
        #[arg(long)]
        no_stream: bool,
    },
    /// Apply a change request to a completed project
    Modify {
        /// Project JSON written by `factory run`
        project_json: PathBuf,

        /// The change to make, e.g. "add a dark mode toggle"
        request: String,

        /// Project root holding .sdlc-factory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Where to write the modified project (defaults to PROJECT_JSON)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List saved project snapshots
    History {
        /// Project root holding .sdlc-factory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let result = match cli.command {
        Commands::Init { dir, force } => cmd::init::execute(dir, force).await,
        Commands::Run {
            prompt,
            theme,
            dir,
            out,
            no_stream,
        } => {
            cmd::run::execute(cmd::run::RunArgs {
                prompt,
                theme,
                dir,
                out,
                stream: !no_stream,
            })
            .await
        }
        Commands::Modify {
            project_json,
            request,
            dir,
            out,
        } => cmd::modify::execute(project_json, request, dir, out).await,
        Commands::History { dir } => cmd::history::execute(dir).await,
    };

    // `{:#}` keeps the whole context chain in the report.
    let succeeded = result.map_err(|e| color_eyre::eyre::eyre!("{e:#}"))?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
