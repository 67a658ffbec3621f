//! Engine configuration

use config_engine::{ensure, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix for engine settings.
pub const ENV_PREFIX: &str = "CLINIC_SYNC_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gate: GateConfig,
    pub backup: BackupConfig,
    pub storage: StorageConfig,
}

/// Sync-safety gate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum local/remote count ratio for a raw overwrite to be allowed.
    pub min_ratio: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { min_ratio: 0.8 }
    }
}

/// Backup worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Directory receiving `hourly/` and `daily/` snapshots.
    pub directory: Option<PathBuf>,
    /// Pending submissions held before new ones are dropped.
    pub queue_capacity: usize,
    /// Attempts per backup slot before giving up.
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            queue_capacity: 4,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl BackupConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Default snapshot locations for the file-backed stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub local_path: PathBuf,
    pub remote_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from("clinic-local.json"),
            remote_path: PathBuf::from("clinic-remote.json"),
        }
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> config_engine::Result<()> {
        ensure(
            self.gate.min_ratio > 0.0 && self.gate.min_ratio <= 1.0,
            "gate.min_ratio",
            "must be in (0, 1]",
        )?;
        ensure(self.backup.queue_capacity >= 1, "backup.queue_capacity", "must be at least 1")?;
        ensure(self.backup.max_attempts >= 1, "backup.max_attempts", "must be at least 1")?;
        Ok(())
    }
}
