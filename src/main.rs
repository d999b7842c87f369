//! # docqa CLI
//!
//! The `docqa` binary loads documents and answers questions about them.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa ingest <paths>...` | Parse and chunk files, print per-file summaries |
//! | `docqa ask --question <q> <paths>...` | Answer one question about the files |
//! | `docqa chat [paths]...` | Interactive session (`/load`, `/reset`, `/history`, `/quit`) |
//!
//! Credentials are read from the environment; a `.env` file in the working
//! directory is honored.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docqa::commands;
use docqa::config::{self, Config};
use docqa::progress::ProgressMode;

/// docqa: chat with your PDF, text, CSV and JSON documents.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: chat with your documents",
    version,
    long_about = "docqa extracts text from PDF, text, CSV and JSON files, indexes it in memory \
    and answers questions with an LLM grounded on the most relevant passages."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docqa.toml`. Built-in defaults are used when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    /// Progress output on stderr: `human`, `json` or `off`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true, value_parser = parse_progress)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and chunk files without indexing them.
    ///
    /// Prints a summary per processed file and the reason for every file
    /// that failed. Exits non-zero when no file could be processed.
    Ingest {
        /// Files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Answer a single question about the given files.
    Ask {
        #[arg(long, short)]
        question: String,

        /// Files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Start an interactive chat session.
    ///
    /// Plain lines are questions. `/load <paths>` replaces the loaded
    /// documents, `/reset` clears everything, `/history` prints the
    /// conversation and `/quit` exits.
    Chat {
        /// Files or directories to load before the first prompt.
        paths: Vec<PathBuf>,
    },
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s).ok_or_else(|| format!("invalid progress mode '{}': use human, json or off", s))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
        Config::default()
    };
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Ingest { paths } => {
            commands::run_ingest(&cfg, &paths, progress).await?;
        }
        Commands::Ask { question, paths } => {
            commands::run_ask(&cfg, &question, &paths, progress).await?;
        }
        Commands::Chat { paths } => {
            commands::run_chat(&cfg, &paths, progress).await?;
        }
    }

    Ok(())
}
