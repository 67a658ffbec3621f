//! Snapshot stores
//!
//! The engine reads whole snapshots from a local store and reads/writes whole
//! snapshots on a remote store. The transport behind either side lives
//! outside this crate; two implementations ship here:
//!
//! - [`JsonFileStore`]: one JSON document on disk, usable for either side
//!   (e.g. a folder synced by a desktop drive client as the remote)
//! - [`InMemoryStore`]: process-local, for embedding and tests

use crate::dataset::Dataset;
use crate::error::{SyncError, SyncResult};
use crate::session::RemoteSession;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// What the remote store returned for a snapshot read.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteSnapshot {
    Found(Dataset),
    /// Nothing has ever been saved remotely. Distinct from a failed fetch.
    NotFound,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Load the locally persisted dataset; an empty dataset when nothing was saved.
    async fn load_local(&self) -> SyncResult<Dataset>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Load the remote snapshot. Unreachable stores must return an error,
    /// never `NotFound`.
    async fn load_remote(&self, session: &RemoteSession) -> SyncResult<RemoteSnapshot>;

    /// Overwrite the remote snapshot.
    async fn save_remote(&self, session: &RemoteSession, dataset: &Dataset) -> SyncResult<()>;
}

/// A dataset stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> SyncResult<Option<Dataset>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(Dataset::from_json(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SyncError::Io(err)),
        }
    }

    /// Write via a sibling temp file and rename so readers never see a
    /// half-written snapshot.
    pub async fn write(&self, dataset: &Dataset) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, dataset.to_json_pretty()?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            records = dataset.total_records(),
            "Wrote dataset snapshot"
        );
        Ok(())
    }
}

#[async_trait]
impl LocalStore for JsonFileStore {
    async fn load_local(&self) -> SyncResult<Dataset> {
        Ok(self.read().await?.unwrap_or_default())
    }
}

#[async_trait]
impl RemoteStore for JsonFileStore {
    async fn load_remote(&self, session: &RemoteSession) -> SyncResult<RemoteSnapshot> {
        session.ensure_connected()?;
        Ok(match self.read().await? {
            Some(dataset) => RemoteSnapshot::Found(dataset),
            None => RemoteSnapshot::NotFound,
        })
    }

    async fn save_remote(&self, session: &RemoteSession, dataset: &Dataset) -> SyncResult<()> {
        session.ensure_connected()?;
        self.write(dataset).await
    }
}

/// Process-local store. Counts writes so callers can observe no-op runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<Option<Dataset>>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            snapshot: RwLock::new(Some(dataset)),
            writes: AtomicUsize::new(0),
        }
    }

    pub async fn snapshot(&self) -> Option<Dataset> {
        self.snapshot.read().await.clone()
    }

    pub async fn replace(&self, dataset: Dataset) {
        *self.snapshot.write().await = Some(dataset);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn load_local(&self) -> SyncResult<Dataset> {
        Ok(self.snapshot().await.unwrap_or_default())
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn load_remote(&self, session: &RemoteSession) -> SyncResult<RemoteSnapshot> {
        session.ensure_connected()?;
        Ok(match self.snapshot().await {
            Some(dataset) => RemoteSnapshot::Found(dataset),
            None => RemoteSnapshot::NotFound,
        })
    }

    async fn save_remote(&self, session: &RemoteSession, dataset: &Dataset) -> SyncResult<()> {
        session.ensure_connected()?;
        self.replace(dataset.clone()).await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
