//! Sync-safety gate
//!
//! Guards the raw "overwrite remote with local" sync path. When the local
//! snapshot holds noticeably fewer patients or transactions than the remote
//! one, local is probably stale (a cleared browser store, a fresh device)
//! and overwriting would destroy remote data. Callers that are refused
//! should reconcile instead.

use crate::config::GateConfig;
use crate::dataset::{Dataset, DatasetStats};
use crate::error::SyncResult;
use crate::session::RemoteSession;
use crate::store::{RemoteSnapshot, RemoteStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDecision {
    pub allow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub local_stats: DatasetStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_stats: Option<DatasetStats>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncSafetyGate {
    config: GateConfig,
}

impl SyncSafetyGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Decide from two snapshots already in hand. `None` means the remote
    /// store has nothing yet.
    pub fn evaluate(&self, local: &Dataset, remote: Option<&Dataset>) -> SyncDecision {
        let local_stats = local.stats();
        let Some(remote) = remote else {
            return SyncDecision {
                allow: true,
                reason: None,
                local_stats,
                remote_stats: None,
            };
        };

        let remote_stats = remote.stats();
        let patient_ratio = ratio(local_stats.patients, remote_stats.patients);
        let transaction_ratio = ratio(local_stats.transactions, remote_stats.transactions);

        let allow = patient_ratio >= self.config.min_ratio
            && transaction_ratio >= self.config.min_ratio;

        let reason = (!allow).then(|| {
            format!(
                "Local data looks incomplete: {} patients locally vs {} remotely, \
                 {} transactions locally vs {} remotely",
                local_stats.patients,
                remote_stats.patients,
                local_stats.transactions,
                remote_stats.transactions,
            )
        });

        if let Some(reason) = &reason {
            tracing::warn!(
                patient_ratio,
                transaction_ratio,
                min_ratio = self.config.min_ratio,
                "{reason}"
            );
        }

        SyncDecision {
            allow,
            reason,
            local_stats,
            remote_stats: Some(remote_stats),
        }
    }

    /// Load the remote snapshot and decide.
    ///
    /// A disconnected session or an absent remote snapshot always allows.
    /// A failed fetch is returned as an error rather than treated as absent.
    pub async fn check(
        &self,
        local: &Dataset,
        remote_store: &dyn RemoteStore,
        session: &RemoteSession,
    ) -> SyncResult<SyncDecision> {
        if !session.is_connected() {
            return Ok(self.evaluate(local, None));
        }

        let snapshot = remote_store.load_remote(session).await?;
        Ok(match snapshot {
            RemoteSnapshot::Found(remote) => self.evaluate(local, Some(&remote)),
            RemoteSnapshot::NotFound => self.evaluate(local, None),
        })
    }
}

/// Local/remote ratio; an empty remote never blocks.
#[allow(clippy::cast_precision_loss)]
fn ratio(local: usize, remote: usize) -> f64 {
    if remote == 0 {
        1.0
    } else {
        local as f64 / remote as f64
    }
}
