use crate::cli::{Cli, Command, StoreArgs};
use anyhow::{Context, Result};
use clinic_sync::config::ENV_PREFIX;
use clinic_sync::{
    BackupScheduler, Dataset, DatasetStats, DirectoryBackupSink, EngineConfig, JsonFileStore,
    LocalStore, MergeReport, Reconciler, RemoteSession, RemoteStore, SyncDecision, SyncSafetyGate,
};
use colored::Colorize;
use config_engine::{ConfigLoader, ConfigSource};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit code of `check` when the gate refuses an overwrite.
pub const EXIT_BLOCKED: u8 = 2;

const APP_NAME: &str = "clinic-sync";

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Reconcile {
            stores,
            backup_dir,
            json,
        } => reconcile(&config, &stores, backup_dir, json).await,
        Command::Check { stores, json } => check(&config, &stores, json).await,
        Command::Stats { file, json } => stats(&file, json).await,
    }
}

/// Defaults, then the config file, then `CLINIC_SYNC_*` variables.
///
/// An explicit `--config` must exist; the per-user default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut loader = ConfigLoader::new();

    if let Some(path) = path {
        loader = loader.add_source(ConfigSource::file(path));
    } else if let Some(default) = ConfigLoader::default_config_path(APP_NAME) {
        loader = loader.add_source(ConfigSource::optional_file(default));
    }

    loader
        .add_source(ConfigSource::env(ENV_PREFIX))
        .load::<EngineConfig>()
        .context("Failed to load configuration")
}

async fn reconcile(
    config: &EngineConfig,
    stores: &StoreArgs,
    backup_dir: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    let (local_path, remote_path) = stores.paths(&config.storage);
    let session = RemoteSession::connected(stores.token.clone(), None);

    let scheduler = backup_dir
        .or_else(|| config.backup.directory.clone())
        .filter(|_| config.backup.enabled)
        .map(|dir| {
            tracing::info!(directory = %dir.display(), "Backups enabled");
            BackupScheduler::spawn(Arc::new(DirectoryBackupSink::new(dir)), &config.backup)
        });

    let mut reconciler = Reconciler::new(
        Arc::new(JsonFileStore::new(local_path)),
        Arc::new(JsonFileStore::new(remote_path)),
    );
    if let Some(scheduler) = &scheduler {
        reconciler = reconciler.with_backup(scheduler.handle());
    }

    let result = reconciler.reconcile(&session).await;
    drop(reconciler);

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await.context("Backup worker failed")?;
    }

    let outcome = result.context("Reconciliation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_report(&outcome.report, outcome.remote_written);
    }
    Ok(ExitCode::SUCCESS)
}

async fn check(config: &EngineConfig, stores: &StoreArgs, json: bool) -> Result<ExitCode> {
    let (local_path, remote_path) = stores.paths(&config.storage);
    let session = RemoteSession::connected(stores.token.clone(), None);

    let local = JsonFileStore::new(local_path)
        .load_local()
        .await
        .context("Failed to load local dataset")?;
    let remote: &dyn RemoteStore = &JsonFileStore::new(remote_path);

    let decision = SyncSafetyGate::new(config.gate.clone())
        .check(&local, remote, &session)
        .await
        .context("Failed to evaluate sync safety")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }

    Ok(if decision.allow {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_BLOCKED)
    })
}

async fn stats(file: &Path, json: bool) -> Result<ExitCode> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let dataset = Dataset::from_json(&raw)
        .with_context(|| format!("{} is not a valid dataset", file.display()))?;
    let stats = dataset.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&file.display().to_string(), &stats);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &MergeReport, remote_written: bool) {
    println!("{}", report.summary().bright_white());
    for (collection, counts) in &report.collections {
        if counts.new_items + counts.skipped_duplicates + counts.remapped_references == 0 {
            continue;
        }
        println!(
            "  {:<22} {:>5} new {:>5} duplicate {:>5} relinked",
            collection, counts.new_items, counts.skipped_duplicates, counts.remapped_references
        );
    }
    if remote_written {
        println!("{}", "Remote updated".bright_green());
    } else {
        println!("{}", "Remote already up to date".bright_blue());
    }
}

fn print_decision(decision: &SyncDecision) {
    if decision.allow {
        println!("{}", "Overwrite allowed".bright_green());
    } else {
        println!("{}", "Overwrite blocked".bright_red());
    }
    if let Some(reason) = &decision.reason {
        println!("  {}", reason.bright_yellow());
    }
    print_stats("local", &decision.local_stats);
    match &decision.remote_stats {
        Some(remote) => print_stats("remote", remote),
        None => println!("  remote: {}", "no snapshot".dimmed()),
    }
}

fn print_stats(label: &str, stats: &DatasetStats) {
    println!(
        "  {}: {} patients, {} transactions, {} records",
        label, stats.patients, stats.transactions, stats.total_records
    );
}
