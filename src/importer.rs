//! Import orchestration: discovery, manifest fetch, normalization, upsert.
//!
//! Runs are resumable: discovery results are cached to disk and every
//! processed item is checkpointed, so an interrupted import picks up
//! where it left off with `--resume`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::ImportConfig;
use crate::discovery;
use crate::fetch::{HttpFetcher, ManifestFetcher};
use crate::record::build_record;
use crate::repository::{self, CommitMode, RepositoryStore, UpsertEngine, UpsertOutcome};
use crate::sources::SourceSpec;

/// Per-invocation switches, mirroring the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Write to the database. Without this every run is a dry run.
    pub execute: bool,
    /// Cap the run at the configured test limit.
    pub test: bool,
    pub limit: Option<usize>,
    /// Reuse the discovery cache and skip already-completed items.
    pub resume: bool,
    /// Stop after discovery, leaving only the cache file.
    pub discover_only: bool,
    /// Refuse to run discovery; the cache must already exist.
    pub skip_discovery: bool,
    /// Database path override.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_discovered: usize,
    pub manifests_fetched: usize,
    pub records_parsed: usize,
    pub fetch_errors: usize,
    /// Manifests fetched but rejected (no usable shelfmark).
    pub parse_errors: usize,
    pub inserted: usize,
    pub updated: usize,
    pub db_errors: usize,
}

pub struct Importer {
    config: ImportConfig,
    fetcher: Arc<dyn ManifestFetcher>,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(&config));
        Self { config, fetcher }
    }

    /// Construct with a caller-supplied fetcher (tests use canned
    /// responses through this).
    pub fn with_fetcher(config: ImportConfig, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        Self { config, fetcher }
    }

    async fn discover(
        &self,
        spec: &SourceSpec,
        opts: &ImportOptions,
        limit: Option<usize>,
    ) -> Result<Vec<crate::models::DiscoveryStub>> {
        let cache_path = self.config.discovery_cache_path(spec.id);

        if opts.skip_discovery {
            return match discovery::load_cache(&cache_path)? {
                Some(stubs) => Ok(stubs),
                None => bail!(
                    "no discovery cache at {}; run without --skip-discovery first",
                    cache_path.display()
                ),
            };
        }

        if opts.resume {
            if let Some(stubs) = discovery::load_cache(&cache_path)? {
                return Ok(stubs);
            }
        }

        let stubs = spec.strategy.discover(self.fetcher.as_ref(), limit).await?;
        discovery::save_cache(&stubs, &cache_path)?;
        Ok(stubs)
    }

    pub async fn run(&self, spec: &SourceSpec, opts: &ImportOptions) -> Result<RunStats> {
        let limit = if opts.test {
            Some(self.config.test_limit)
        } else {
            opts.limit
        };

        let mut stubs = self.discover(spec, opts, limit).await?;
        let mut stats = RunStats {
            total_discovered: stubs.len(),
            ..Default::default()
        };

        if opts.discover_only {
            println!(
                "\nDiscovery complete. {} manuscripts found.\nCache saved to: {}",
                stubs.len(),
                self.config.discovery_cache_path(spec.id).display()
            );
            return Ok(stats);
        }

        let db_path = opts
            .db_path
            .clone()
            .unwrap_or_else(|| self.config.db_path.clone());
        let conn = repository::connect_existing(&db_path)?;

        let checkpoint_path = self.config.checkpoint_path(spec.id);
        let mut checkpoint = if opts.resume {
            CheckpointStore::load(&checkpoint_path)?
        } else {
            CheckpointStore::fresh(&checkpoint_path)
        };
        checkpoint.set_total_discovered(stubs.len())?;

        if opts.resume {
            let before = stubs.len();
            stubs = checkpoint.filter_pending(stubs);
            info!(
                "Resuming: {} already completed, {} remaining",
                before - stubs.len(),
                stubs.len()
            );
        }
        if let Some(limit) = limit {
            stubs.truncate(limit);
        }

        let mode = if opts.execute {
            CommitMode::Execute
        } else {
            CommitMode::DryRun
        };
        let repo_store = RepositoryStore::new(&conn);
        let repository_id = match mode {
            CommitMode::Execute => repo_store.ensure(&spec.repository)?,
            // A dry run must not create rows; an unseen repository gets
            // a sentinel ID that matches nothing.
            CommitMode::DryRun => repo_store
                .find(&spec.repository.short_name)?
                .map(|row| row.id)
                .unwrap_or(-1),
        };
        let engine = UpsertEngine::new(&conn, mode);

        let interrupted = Arc::new(AtomicBool::new(false));
        {
            let flag = interrupted.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    flag.store(true, Ordering::SeqCst);
                }
            });
        }

        let progress = ProgressBar::new(stubs.len() as u64);
        progress.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} {msg}",
        )?);

        for stub in &stubs {
            if interrupted.load(Ordering::SeqCst) {
                warn!("Interrupted; progress saved, rerun with --resume");
                break;
            }
            progress.set_message(
                stub.shelfmark
                    .clone()
                    .unwrap_or_else(|| stub.id.clone()),
            );

            let manifest_url = spec.manifest_url(stub);
            let manifest = match &manifest_url {
                Some(url) => {
                    stats.manifests_fetched += 1;
                    self.fetcher.fetch_json(url).await
                }
                None => None,
            };
            if manifest_url.is_some() && manifest.is_none() {
                stats.fetch_errors += 1;
                checkpoint.mark_failed(&stub.id)?;
                progress.inc(1);
                continue;
            }

            let mut stub = stub.clone();
            let source_url = spec.source_url(&stub);
            stub.source_url = source_url;

            match build_record(&stub, manifest.as_ref(), manifest_url.as_deref(), &spec.policy) {
                Some(record) => {
                    stats.records_parsed += 1;
                    match engine.upsert(repository_id, &record) {
                        Ok(UpsertOutcome::Inserted) => {
                            stats.inserted += 1;
                            checkpoint.mark_completed(&stub.id)?;
                        }
                        Ok(UpsertOutcome::Updated) => {
                            stats.updated += 1;
                            checkpoint.mark_completed(&stub.id)?;
                        }
                        Err(e) => {
                            stats.db_errors += 1;
                            warn!("Error importing {}: {e}", record.shelfmark);
                            checkpoint.mark_failed(&stub.id)?;
                        }
                    }
                }
                None => {
                    stats.parse_errors += 1;
                    checkpoint.mark_failed(&stub.id)?;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        print_summary(spec, mode, &stats);
        Ok(stats)
    }
}

fn print_summary(spec: &SourceSpec, mode: CommitMode, stats: &RunStats) {
    let dry_run = mode == CommitMode::DryRun;
    let banner = format!(
        "{}{} IMPORT SUMMARY",
        if dry_run { "DRY RUN - " } else { "" },
        spec.repository.name.to_uppercase()
    );
    println!("\n{}", style("=".repeat(70)).dim());
    println!("{}", style(banner).bold());
    println!("{}", style("=".repeat(70)).dim());
    println!("\nDiscovery:");
    println!("  Total discovered:     {}", stats.total_discovered);
    println!("\nIIIF manifest fetch:");
    println!("  Manifests fetched:    {}", stats.manifests_fetched);
    println!("  Records parsed:       {}", stats.records_parsed);
    println!("  Fetch errors:         {}", stats.fetch_errors);
    println!("  Parse errors:         {}", stats.parse_errors);
    println!(
        "\nDatabase operations{}:",
        if dry_run { " (would be)" } else { "" }
    );
    println!(
        "  {} {}",
        if dry_run { "Would insert:" } else { "Inserted:    " },
        style(stats.inserted).green()
    );
    println!(
        "  {} {}",
        if dry_run { "Would update:" } else { "Updated:     " },
        style(stats.updated).yellow()
    );
    println!("  Errors:       {}", stats.db_errors);

    if dry_run {
        println!(
            "\n{}",
            style("This was a DRY RUN. No changes were made to the database.").bold()
        );
        println!("Run with --execute to apply changes.");
    }
}
