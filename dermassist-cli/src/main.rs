//! dermassist CLI tool

#![allow(clippy::multiple_crate_versions)]

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{AnalyzeCommand, SessionCommand};
use console::style;
use dermassist::observability::{self, LogFormat, ObservabilityConfig};
use dermassist_cli_lib::interrupt::{run_until_interrupted, INTERRUPTED_EXIT_CODE};
use dermassist_cli_lib::{GlobalArgs, DISCLAIMER};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "dermassist")]
#[command(version)]
#[command(about = "Upload a skin image and get an educational analysis", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one image and exit
    Analyze {
        /// Path to a JPG, PNG or WEBP image
        path: PathBuf,
    },
    /// Interactive session (default)
    Session,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    observability::init_with(
        &ObservabilityConfig::default()
            .with_filter(cli.global.log_filter())
            .with_format(LogFormat::Compact),
    )?;

    if let Some(result) = run_until_interrupted(run(cli), tokio::signal::ctrl_c())? {
        return result;
    }

    let _ = std::io::stdout().flush();
    eprintln!();
    eprintln!("{}", style("Interrupted").yellow());
    Ok(ExitCode::from(INTERRUPTED_EXIT_CODE))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.global.resolve()?;

    println!("{}", style(DISCLAIMER).yellow());
    println!();

    debug!(
        backend = %config.backend_url,
        timeout_ms = config.request_timeout_ms,
        "Resolved configuration"
    );

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Analyze { path } => {
            info!(path = %path.display(), "Running one-shot analysis");
            let succeeded = AnalyzeCommand::new(path).execute(&config).await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Session => {
            info!("Starting interactive session");
            SessionCommand::new().execute(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
