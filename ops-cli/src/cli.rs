use clap::{Args, Parser, Subcommand};
use clinic_sync::StorageConfig;
use std::path::PathBuf;

/// ClinicSync operator tool
#[derive(Parser, Debug)]
#[command(name = "clinic-sync")]
#[command(about = "Reconcile offline clinic datasets with their shared remote copy")]
#[command(version)]
pub struct Cli {
    /// Configuration file path (YAML or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge the local dataset into the remote one and save the result
    Reconcile {
        #[command(flatten)]
        stores: StoreArgs,

        /// Write hourly/daily backups below this directory after a save
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Print the merge report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the sync-safety gate whether local may overwrite remote
    Check {
        #[command(flatten)]
        stores: StoreArgs,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show record counts for a dataset file
    Stats {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Local dataset file [default: storage.local_path]
    #[arg(long)]
    pub local: Option<PathBuf>,

    /// Remote dataset file [default: storage.remote_path]
    #[arg(long)]
    pub remote: Option<PathBuf>,

    /// Access token for the remote session
    #[arg(long, env = "CLINIC_SYNC_TOKEN", hide_env_values = true, default_value = "local-file")]
    pub token: String,
}

impl StoreArgs {
    /// Paths from the command line, falling back to configured storage.
    pub fn paths(&self, storage: &StorageConfig) -> (PathBuf, PathBuf) {
        (
            self.local.clone().unwrap_or_else(|| storage.local_path.clone()),
            self.remote.clone().unwrap_or_else(|| storage.remote_path.clone()),
        )
    }
}
