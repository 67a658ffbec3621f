//! End-to-end reconciliation runs through in-memory stores.

use async_trait::async_trait;
use clinic_sync::records::{InventoryItem, Patient, SoapNote, Transaction};
use clinic_sync::{
    Dataset, InMemoryStore, Reconciler, RemoteSession, RemoteSnapshot, RemoteStore, SyncError,
    SyncResult, SyncSafetyGate,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn session() -> RemoteSession {
    RemoteSession::connected("integration-token", None)
}

fn reconciler(local: &Arc<InMemoryStore>, remote: &Arc<InMemoryStore>) -> Reconciler {
    Reconciler::new(local.clone(), remote.clone())
}

/// Remote that is never reachable.
#[derive(Default)]
struct UnreachableRemote {
    saves: AtomicUsize,
}

#[async_trait]
impl RemoteStore for UnreachableRemote {
    async fn load_remote(&self, _session: &RemoteSession) -> SyncResult<RemoteSnapshot> {
        Err(SyncError::Network("connection timed out".to_string()))
    }

    async fn save_remote(&self, _session: &RemoteSession, _dataset: &Dataset) -> SyncResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_local_duplicate_relinks_transaction() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("cloud-1", "Alice", "1990-01-01")],
        ..Dataset::default()
    }));
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("local-1", "Alice", "1990-01-01")],
        transactions: vec![Transaction::new("t1", Some("local-1"))],
        ..Dataset::default()
    }));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    let merged = &outcome.dataset;
    assert_eq!(merged.patients, vec![Patient::new("cloud-1", "Alice", "1990-01-01")]);
    assert_eq!(merged.transactions.len(), 1);
    assert_eq!(merged.transactions[0].patient_id.as_deref(), Some("cloud-1"));
    assert_eq!(outcome.report.remapped_references, 1);
    assert_eq!(outcome.report.skipped_duplicates, 1);
    assert_eq!(outcome.report.new_items_count, 0);
    // The relinked transaction is still new to the remote, so it is saved.
    assert_eq!(outcome.report.new_records(), 1);
    assert!(outcome.remote_written);
    assert_eq!(remote.snapshot().await.unwrap(), outcome.dataset);
}

#[tokio::test]
async fn test_duplicates_within_local_batch_collapse() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset::default()));
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![
            Patient::new("local-1", "Alice", "1990-01-01"),
            Patient::new("local-2", "Alice", "1990-01-01"),
        ],
        soap_notes: vec![SoapNote::new("n1", Some("local-2"))],
        ..Dataset::default()
    }));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(outcome.dataset.patients.len(), 1);
    assert_eq!(outcome.dataset.patients[0].id, "local-1");
    assert_eq!(outcome.dataset.soap_notes[0].patient_id.as_deref(), Some("local-1"));
    assert_eq!(outcome.report.new_items_count, 1);
    assert_eq!(outcome.report.skipped_duplicates, 1);
}

#[tokio::test]
async fn test_inventory_matches_case_insensitively() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset {
        inventory: vec![InventoryItem::new("i1", "Vitamin C", "B001")],
        ..Dataset::default()
    }));
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        inventory: vec![InventoryItem::new("i2", "VITAMIN C", "B001")],
        ..Dataset::default()
    }));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(outcome.dataset.inventory.len(), 1);
    assert_eq!(outcome.dataset.inventory[0].id, "i1");
    assert_eq!(outcome.report.collections["inventory"].skipped_duplicates, 1);
    assert!(!outcome.remote_written);
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn test_empty_datasets_write_nothing() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset::default()));
    let local = Arc::new(InMemoryStore::new());

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(outcome.dataset, Dataset::default());
    assert_eq!(outcome.report.new_items_count, 0);
    assert_eq!(outcome.report.skipped_duplicates, 0);
    assert_eq!(outcome.report.remapped_references, 0);
    assert!(!outcome.remote_written);
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn test_gate_blocks_stale_local() {
    let patients = |count: usize| -> Vec<Patient> {
        (0..count)
            .map(|i| Patient::new(format!("p{i}"), &format!("Patient {i}"), "1970-01-01"))
            .collect()
    };
    let local = Dataset {
        patients: patients(3),
        ..Dataset::default()
    };
    let remote = InMemoryStore::with_dataset(Dataset {
        patients: patients(10),
        ..Dataset::default()
    });

    let decision = SyncSafetyGate::default()
        .check(&local, &remote, &session())
        .await
        .unwrap();

    assert!(!decision.allow);
    let reason = decision.reason.unwrap();
    assert!(reason.contains('3'));
    assert!(reason.contains("10"));
}

#[tokio::test]
async fn test_unreachable_remote_aborts_without_saving() {
    let remote = Arc::new(UnreachableRemote::default());
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("local-1", "Alice", "1990-01-01")],
        ..Dataset::default()
    }));

    let result = Reconciler::new(local, remote.clone()).reconcile(&session()).await;

    assert!(matches!(result, Err(SyncError::Network(_))));
    assert_eq!(remote.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("cloud-1", "Alice", "1990-01-01")],
        transactions: vec![Transaction::new("t0", Some("cloud-1"))],
        ..Dataset::default()
    }));
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![
            Patient::new("local-1", "Alice", "1990-01-01"),
            Patient::new("local-2", "Bob", "1985-03-03"),
        ],
        transactions: vec![
            Transaction::new("t1", Some("local-1")),
            Transaction::new("t2", Some("local-2")),
        ],
        inventory: vec![InventoryItem::new("i1", "Amoxicillin", "A-17")],
        ..Dataset::default()
    }));

    let first = reconciler(&local, &remote).reconcile(&session()).await.unwrap();
    assert!(first.remote_written);
    assert_eq!(remote.write_count(), 1);
    let after_first = remote.snapshot().await.unwrap();

    let second = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(second.report.new_items_count, 0);
    assert_eq!(second.report.new_records(), 0);
    assert_eq!(second.report.remapped_references, 0);
    assert!(!second.remote_written);
    assert_eq!(remote.write_count(), 1);
    assert_eq!(remote.snapshot().await.unwrap(), after_first);
}

#[tokio::test]
async fn test_first_upload_to_empty_remote() {
    let remote = Arc::new(InMemoryStore::new());
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("local-1", "Alice", "1990-01-01")],
        ..Dataset::default()
    }));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert!(outcome.remote_written);
    assert_eq!(remote.snapshot().await.unwrap().patients.len(), 1);
}

#[tokio::test]
async fn test_local_store_is_never_written() {
    let remote = Arc::new(InMemoryStore::with_dataset(Dataset::default()));
    let local_data = Dataset {
        patients: vec![Patient::new("local-1", "Alice", "1990-01-01")],
        ..Dataset::default()
    };
    let local = Arc::new(InMemoryStore::with_dataset(local_data.clone()));

    reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(local.write_count(), 0);
    assert_eq!(local.snapshot().await.unwrap(), local_data);
}

#[tokio::test]
async fn test_unknown_remote_collection_survives_write_back() {
    let remote = Arc::new(InMemoryStore::with_dataset(
        Dataset::from_json(
            r#"{
                "patients": [{ "id": "cloud-1", "name": "Alice", "dateOfBirth": "1990-01-01" }],
                "appointments": [{ "id": "a1", "patientId": "cloud-1", "slot": "09:30" }]
            }"#,
        )
        .unwrap(),
    ));
    let local = Arc::new(InMemoryStore::with_dataset(Dataset {
        patients: vec![Patient::new("local-1", "Bob", "1985-03-03")],
        ..Dataset::default()
    }));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();
    assert!(outcome.remote_written);

    let saved = serde_json::to_value(remote.snapshot().await.unwrap()).unwrap();
    assert_eq!(saved["patients"].as_array().unwrap().len(), 2);
    assert_eq!(saved["appointments"][0]["id"], "a1");
    assert_eq!(saved["appointments"][0]["slot"], "09:30");
}

#[tokio::test]
async fn test_null_collections_do_not_abort_reconcile() {
    let remote = Arc::new(InMemoryStore::with_dataset(
        Dataset::from_json(r#"{ "patients": null, "transactions": null }"#).unwrap(),
    ));
    let local = Arc::new(InMemoryStore::with_dataset(
        Dataset::from_json(
            r#"{ "patients": [{ "id": "local-1", "name": "Alice", "dateOfBirth": "1990-01-01" }], "soapNotes": null }"#,
        )
        .unwrap(),
    ));

    let outcome = reconciler(&local, &remote).reconcile(&session()).await.unwrap();

    assert_eq!(outcome.dataset.patients.len(), 1);
    assert!(outcome.dataset.soap_notes.is_empty());
    assert!(outcome.remote_written);
}
