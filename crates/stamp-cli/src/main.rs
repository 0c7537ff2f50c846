//! Stamp command-line entry point
//!
//! Subcommands:
//! - `replay`: drive the stamp tool with a recorded session
//! - `export`: render every tile of an image through external commands

mod error;
mod export;
mod replay;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "stamp")]
#[command(about = "Replay stamp tool sessions and batch-export tiled images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded session and print the resulting scene as RON
    Replay {
        /// Session file (.ron)
        session: PathBuf,
    },
    /// Run a batch export job
    Export {
        /// Export job file (.ron)
        job: PathBuf,
    },
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stamp_cli=info,stamp_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Replay { session } => {
            let result = replay::replay_file(&session)?;
            tracing::info!(
                placed = result.placed,
                failed = result.failed,
                "Replay finished"
            );
            println!("{}", result.scene_ron()?);
        }
        Commands::Export { job } => {
            let report = export::export_file(&job)?;
            println!("{}", report.rendered.join("\n"));
        }
    }
    Ok(())
}
