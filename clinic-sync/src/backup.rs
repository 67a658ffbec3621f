//! Background backup of merged snapshots
//!
//! The orchestrator hands every freshly written dataset to a [`BackupHandle`]
//! and moves on. A single worker task drains the queue, decides which backup
//! slots are due (one per hour label, one per day label) and writes them
//! through a [`BackupSink`], retrying on failure. Nothing here can fail a
//! reconciliation run.

use crate::config::BackupConfig;
use crate::dataset::Dataset;
use crate::error::{SyncError, SyncResult};
use crate::store::JsonFileStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const HOUR_LABEL_FORMAT: &str = "%Y-%m-%dT%H";
const DAY_LABEL_FORMAT: &str = "%Y-%m-%d";

/// A backup destination within its rotation bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupSlot {
    Hourly(String),
    Daily(String),
}

impl BackupSlot {
    pub fn kind(&self) -> &'static str {
        match self {
            BackupSlot::Hourly(_) => "hourly",
            BackupSlot::Daily(_) => "daily",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BackupSlot::Hourly(label) | BackupSlot::Daily(label) => label,
        }
    }
}

/// Timestamps of the last successful hourly and daily backups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupThrottle {
    last_hourly: Option<DateTime<Utc>>,
    last_daily: Option<DateTime<Utc>>,
}

impl BackupThrottle {
    /// Slots whose label at `now` has not been backed up yet.
    pub fn due_slots(&self, now: DateTime<Utc>) -> Vec<BackupSlot> {
        let mut due = Vec::with_capacity(2);

        let hour = now.format(HOUR_LABEL_FORMAT).to_string();
        if !label_matches(self.last_hourly, HOUR_LABEL_FORMAT, &hour) {
            due.push(BackupSlot::Hourly(hour));
        }

        let day = now.format(DAY_LABEL_FORMAT).to_string();
        if !label_matches(self.last_daily, DAY_LABEL_FORMAT, &day) {
            due.push(BackupSlot::Daily(day));
        }

        due
    }

    pub fn mark_done(&mut self, slot: &BackupSlot, at: DateTime<Utc>) {
        match slot {
            BackupSlot::Hourly(_) => self.last_hourly = Some(at),
            BackupSlot::Daily(_) => self.last_daily = Some(at),
        }
    }
}

fn label_matches(last: Option<DateTime<Utc>>, format: &str, label: &str) -> bool {
    last.is_some_and(|at| at.format(format).to_string() == label)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackupSink: Send + Sync {
    async fn write_backup(&self, slot: &BackupSlot, dataset: &Dataset) -> SyncResult<()>;
}

/// Writes `<root>/<hourly|daily>/<label>.json`, replacing an older file for
/// the same label.
#[derive(Debug, Clone)]
pub struct DirectoryBackupSink {
    root: PathBuf,
}

impl DirectoryBackupSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, slot: &BackupSlot) -> PathBuf {
        self.root
            .join(slot.kind())
            .join(format!("{}.json", slot.label()))
    }
}

#[async_trait]
impl BackupSink for DirectoryBackupSink {
    async fn write_backup(&self, slot: &BackupSlot, dataset: &Dataset) -> SyncResult<()> {
        JsonFileStore::new(self.path_for(slot)).write(dataset).await
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cheap, cloneable submission side of the backup queue.
#[derive(Debug, Clone)]
pub struct BackupHandle {
    tx: mpsc::Sender<Dataset>,
}

impl BackupHandle {
    /// Queue a dataset for backup without waiting. Returns `false` when the
    /// queue is full or the worker has stopped; the dataset is then dropped.
    pub fn submit(&self, dataset: Dataset) -> bool {
        match self.tx.try_send(dataset) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Backup queue full, skipping this snapshot");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Backup worker stopped, snapshot not backed up");
                false
            }
        }
    }
}

/// Owns the backup worker task.
pub struct BackupScheduler {
    handle: BackupHandle,
    task: JoinHandle<()>,
}

impl BackupScheduler {
    pub fn spawn(sink: Arc<dyn BackupSink>, config: &BackupConfig) -> Self {
        Self::spawn_with_clock(sink, config, Arc::new(Utc::now))
    }

    pub fn spawn_with_clock(sink: Arc<dyn BackupSink>, config: &BackupConfig, clock: Clock) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = BackupWorker {
            sink,
            clock,
            throttle: BackupThrottle::default(),
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff(),
        };

        Self {
            handle: BackupHandle { tx },
            task: tokio::spawn(worker.run(rx)),
        }
    }

    pub fn handle(&self) -> BackupHandle {
        self.handle.clone()
    }

    /// Close the queue and wait for pending backups to finish.
    ///
    /// Other handles keep the queue open; drop them before calling this.
    pub async fn shutdown(self) -> SyncResult<()> {
        drop(self.handle);
        self.task
            .await
            .map_err(|err| SyncError::Backup(format!("backup worker terminated abnormally: {err}")))
    }
}

struct BackupWorker {
    sink: Arc<dyn BackupSink>,
    clock: Clock,
    throttle: BackupThrottle,
    max_attempts: u32,
    backoff: Duration,
}

impl BackupWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<Dataset>) {
        while let Some(dataset) = rx.recv().await {
            let now = (self.clock)();
            for slot in self.throttle.due_slots(now) {
                if self.write_with_retry(&slot, &dataset).await {
                    self.throttle.mark_done(&slot, now);
                }
            }
        }
        tracing::debug!("Backup queue closed, worker exiting");
    }

    async fn write_with_retry(&self, slot: &BackupSlot, dataset: &Dataset) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.sink.write_backup(slot, dataset).await {
                Ok(()) => {
                    tracing::info!(kind = slot.kind(), label = slot.label(), "Backup written");
                    return true;
                }
                Err(err) if attempt < self.max_attempts => {
                    tracing::warn!(
                        kind = slot.kind(),
                        attempt,
                        error = %logger_redacted::redact(&err.to_string()),
                        "Backup failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(err) => {
                    tracing::error!(
                        kind = slot.kind(),
                        attempts = self.max_attempts,
                        error = %logger_redacted::redact(&err.to_string()),
                        "Backup failed, giving up"
                    );
                }
            }
        }
        false
    }
}
