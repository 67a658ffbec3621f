//! Error types for the reconciliation engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote session is not connected")]
    NotConnected,

    #[error("Remote store rejected the snapshot: {0}")]
    RemoteWriteRejected(String),

    #[error("Backup error: {0}")]
    Backup(String),
}

impl SyncError {
    /// Whether a caller may reasonably retry the failed operation later.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Io(_) | SyncError::Network(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            SyncError::Deserialization(err.to_string())
        } else {
            SyncError::Serialization(err.to_string())
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
