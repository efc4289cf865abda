//! CLI parser and command dispatch.

mod import;
mod init;
mod sources;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ImportConfig;

#[derive(Parser)]
#[command(name = "compilatio")]
#[command(about = "Medieval manuscript metadata aggregator")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true, env = "COMPILATIO_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(long, global = true, env = "COMPILATIO_DB")]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema
    Init,

    /// List the built-in sources
    Sources,

    /// Import one source's manuscripts
    Import {
        /// Source ID (see `compilatio sources`)
        source_id: String,

        /// Actually write to the database (default is dry-run)
        #[arg(long)]
        execute: bool,

        /// Test mode: process only the first few manuscripts
        #[arg(long)]
        test: bool,

        /// Limit number of manuscripts to process
        #[arg(long)]
        limit: Option<usize>,

        /// Resume from the discovery cache and checkpoint
        #[arg(long)]
        resume: bool,

        /// Only run discovery, save to cache
        #[arg(long)]
        discover_only: bool,

        /// Skip discovery, use cached data only
        #[arg(long)]
        skip_discovery: bool,

        /// Directory for discovery caches and checkpoints (overrides config)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Show per-repository manuscript counts
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ImportConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }

    match cli.command {
        Commands::Init => init::cmd_init(&config),
        Commands::Sources => sources::cmd_sources(),
        Commands::Import {
            source_id,
            execute,
            test,
            limit,
            resume,
            discover_only,
            skip_discovery,
            cache_dir,
        } => {
            if let Some(dir) = cache_dir {
                config.cache_dir = dir;
            }
            import::cmd_import(
                &config,
                &source_id,
                crate::importer::ImportOptions {
                    execute,
                    test,
                    limit,
                    resume,
                    discover_only,
                    skip_discovery,
                    db_path: None,
                },
            )
            .await
        }
        Commands::Status => status::cmd_status(&config),
    }
}
