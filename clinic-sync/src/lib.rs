//! Offline-first reconciliation engine for clinic datasets
//!
//! Merges a locally held copy of the dataset with the copy in a remote
//! store without losing or duplicating records:
//! - Content-keyed deduplication of patients (name + date of birth) and
//!   inventory batches (drug name + batch number)
//! - Remapping of dependent records onto the surviving patient id
//! - Id-based merge of every other collection
//! - A safety gate in front of raw overwrite syncs
//! - Fire-and-forget hourly/daily backups after each remote write

pub mod backup;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gate;
pub mod keys;
pub mod merge;
pub mod orchestrator;
pub mod records;
pub mod remap;
pub mod report;
pub mod session;
pub mod store;

pub use backup::{BackupHandle, BackupScheduler, BackupSink, BackupSlot, DirectoryBackupSink};
pub use config::{BackupConfig, EngineConfig, GateConfig, StorageConfig};
pub use dataset::{Dataset, DatasetStats};
pub use error::{SyncError, SyncResult};
pub use gate::{SyncDecision, SyncSafetyGate};
pub use keys::{inventory_key, patient_key, ContentKeyed};
pub use merge::{merge_datasets, DatasetMerge};
pub use orchestrator::{ReconcileOutcome, Reconciler, SyncOutcome};
pub use records::{HasId, HasPatientId};
pub use remap::RemapTable;
pub use report::{CollectionReport, MergeReport};
pub use session::RemoteSession;
pub use store::{InMemoryStore, JsonFileStore, LocalStore, RemoteSnapshot, RemoteStore};
