//! Login Detect CLI - login form detection for screenshots

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::analyze::AnalyzeCommand;

#[derive(Parser)]
#[command(
    name = "login-detect",
    version,
    about = "Detect login forms in screenshots",
    after_help = "EXAMPLES:\n  \
                  # Analyze one screenshot\n  \
                  login-detect analyze screenshot.png\n\n  \
                  # Stricter verdict, JSON output\n  \
                  login-detect analyze --threshold 0.8 --json *.png\n\n  \
                  # Save copies with detected fields outlined\n  \
                  login-detect analyze --annotate ./annotated screenshot.png"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze screenshots and report whether they show a login form
    Analyze(AnalyzeCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // stdout is reserved for results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute(),
    }
}
