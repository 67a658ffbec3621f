//! Reconciliation orchestrator
//!
//! One run:
//! 1. Load the remote snapshot; a failed fetch aborts the run.
//! 2. Load the local snapshot.
//! 3. Merge (patients, inventory, linked collections, id-only collections).
//! 4. Write the result back only when it adds records or relinks
//!    references the remote lacks, then queue a backup.
//!
//! Local data is only ever read.

use crate::backup::BackupHandle;
use crate::dataset::Dataset;
use crate::error::SyncResult;
use crate::gate::{SyncDecision, SyncSafetyGate};
use crate::merge::{merge_datasets, DatasetMerge};
use crate::report::MergeReport;
use crate::session::RemoteSession;
use crate::store::{LocalStore, RemoteSnapshot, RemoteStore};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Result of a successful reconciliation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub dataset: Dataset,
    pub report: MergeReport,
    /// Whether the merged dataset was saved to the remote store.
    pub remote_written: bool,
}

/// Which path [`Reconciler::sync_or_reconcile`] took.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The gate allowed it and remote was overwritten with local.
    Overwritten { decision: SyncDecision },
    /// The gate refused the overwrite; a merge ran instead.
    Reconciled {
        decision: SyncDecision,
        outcome: ReconcileOutcome,
    },
}

pub struct Reconciler {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    backup: Option<BackupHandle>,
}

impl Reconciler {
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local,
            remote,
            backup: None,
        }
    }

    /// Queue a backup after every remote write.
    pub fn with_backup(mut self, backup: BackupHandle) -> Self {
        self.backup = Some(backup);
        self
    }

    /// Merge local into remote and persist the result when it changed.
    ///
    /// Safe to call repeatedly: a second run with no new local data writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Fails, without writing anything, when either snapshot cannot be
    /// loaded; fails when the remote write fails.
    pub async fn reconcile(&self, session: &RemoteSession) -> SyncResult<ReconcileOutcome> {
        let span = tracing::info_span!("reconcile", run_id = %Uuid::new_v4(), session_id = %session.id());

        async {
            let snapshot = self.load_remote(session).await?;
            let local = self.local.load_local().await?;
            self.reconcile_snapshots(session, snapshot, local).await
        }
        .instrument(span)
        .await
    }

    /// Overwrite remote with local when the safety gate allows it, otherwise
    /// reconcile.
    ///
    /// # Errors
    ///
    /// Fails when the session is not connected or either store fails.
    pub async fn sync_or_reconcile(
        &self,
        session: &RemoteSession,
        gate: &SyncSafetyGate,
    ) -> SyncResult<SyncOutcome> {
        let span = tracing::info_span!("sync", run_id = %Uuid::new_v4(), session_id = %session.id());

        async {
            session.ensure_connected()?;
            let snapshot = self.load_remote(session).await?;
            let local = self.local.load_local().await?;

            let remote = match &snapshot {
                RemoteSnapshot::Found(remote) => Some(remote),
                RemoteSnapshot::NotFound => None,
            };
            let decision = gate.evaluate(&local, remote);

            if decision.allow {
                self.remote.save_remote(session, &local).await?;
                tracing::info!(records = local.total_records(), "Remote overwritten with local snapshot");
                self.queue_backup(&local);
                return Ok(SyncOutcome::Overwritten { decision });
            }

            tracing::info!("Overwrite refused by safety gate, reconciling instead");
            let outcome = self.reconcile_snapshots(session, snapshot, local).await?;
            Ok(SyncOutcome::Reconciled { decision, outcome })
        }
        .instrument(span)
        .await
    }

    async fn load_remote(&self, session: &RemoteSession) -> SyncResult<RemoteSnapshot> {
        self.remote.load_remote(session).await.map_err(|err| {
            tracing::error!(
                error = %logger_redacted::redact(&err.to_string()),
                transient = err.is_transient(),
                "Failed to load remote snapshot, aborting"
            );
            err
        })
    }

    async fn reconcile_snapshots(
        &self,
        session: &RemoteSession,
        snapshot: RemoteSnapshot,
        local: Dataset,
    ) -> SyncResult<ReconcileOutcome> {
        let (remote, bootstrapping) = match snapshot {
            RemoteSnapshot::Found(remote) => (remote, false),
            RemoteSnapshot::NotFound => {
                tracing::info!("No remote snapshot yet, treating remote as empty");
                (Dataset::default(), true)
            }
        };

        let local_has_data = !local.is_empty();
        let local_profile = bootstrapping.then(|| local.doctor_profile.clone()).flatten();

        let DatasetMerge {
            mut dataset,
            report,
            remap,
        } = merge_datasets(remote, local);

        // No remote copy exists to win, so the first upload keeps local's profile.
        if bootstrapping && dataset.doctor_profile.is_none() {
            dataset.doctor_profile = local_profile;
        }

        tracing::info!(
            new_patients = report.new_items_count,
            new_records = report.new_records(),
            skipped_duplicates = report.skipped_duplicates,
            remapped_references = report.remapped_references,
            remapped_patients = remap.len(),
            "Merge complete"
        );

        let remote_written = report.has_changes() || (bootstrapping && local_has_data);
        if remote_written {
            self.remote.save_remote(session, &dataset).await.map_err(|err| {
                tracing::error!(
                    error = %logger_redacted::redact(&err.to_string()),
                    "Failed to save merged snapshot"
                );
                err
            })?;
            tracing::info!(summary = %report.summary(), "Merged snapshot saved to remote");
            self.queue_backup(&dataset);
        } else {
            tracing::debug!("Remote already up to date, skipping write");
        }

        Ok(ReconcileOutcome {
            dataset,
            report,
            remote_written,
        })
    }

    fn queue_backup(&self, dataset: &Dataset) {
        if let Some(backup) = &self.backup {
            backup.submit(dataset.clone());
        }
    }
}
