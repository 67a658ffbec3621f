//! Merge invariants over generated datasets.

use clinic_sync::records::{InventoryItem, Patient, Prescription, Transaction};
use clinic_sync::{merge_datasets, ContentKeyed, Dataset, HasId, HasPatientId};
use proptest::prelude::*;
use std::collections::HashSet;

const NAMES: &[&str] = &["Alice", "alice ", "ALICE", "Bob", "Chen Wei", "", "  "];
const BIRTH_DATES: &[&str] = &["1990-01-01", "1985-06-15", ""];
const DRUGS: &[&str] = &["Vitamin C", "VITAMIN C", "Amoxicillin", "Paracetamol", ""];
const BATCHES: &[&str] = &["B001", "b001", "A-17", ""];

fn patients(prefix: &'static str) -> impl Strategy<Value = Vec<Patient>> {
    prop::collection::vec(
        (prop::sample::select(NAMES), prop::sample::select(BIRTH_DATES)),
        0..8,
    )
    .prop_map(move |people| {
        people
            .into_iter()
            .enumerate()
            .map(|(i, (name, dob))| Patient::new(format!("{prefix}-p{i}"), name, dob))
            .collect()
    })
}

fn inventory(prefix: &'static str) -> impl Strategy<Value = Vec<InventoryItem>> {
    prop::collection::vec(
        (prop::sample::select(DRUGS), prop::sample::select(BATCHES)),
        0..6,
    )
    .prop_map(move |batches| {
        batches
            .into_iter()
            .enumerate()
            .map(|(i, (drug, batch))| InventoryItem::new(format!("{prefix}-i{i}"), drug, batch))
            .collect()
    })
}

/// Remote snapshots are internally consistent: one record per content key.
fn without_key_duplicates<T: ContentKeyed>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.content_key()))
        .collect()
}

/// A side's dataset whose dependent records only point at that side's patients.
fn side(prefix: &'static str, dedupe: bool) -> impl Strategy<Value = Dataset> {
    (
        patients(prefix),
        inventory(prefix),
        prop::collection::vec(any::<prop::sample::Index>(), 0..10),
        prop::collection::vec(any::<prop::sample::Index>(), 0..5),
    )
        .prop_map(move |(patients, inventory, tx_links, rx_links)| {
            let (patients, inventory) = if dedupe {
                (without_key_duplicates(patients), without_key_duplicates(inventory))
            } else {
                (patients, inventory)
            };
            let link = |index: &prop::sample::Index| -> Option<String> {
                (!patients.is_empty()).then(|| index.get(&patients).id.clone())
            };

            let transactions = tx_links
                .iter()
                .enumerate()
                .map(|(i, index)| Transaction::new(format!("{prefix}-t{i}"), link(index).as_deref()))
                .collect();
            let prescriptions = rx_links
                .iter()
                .enumerate()
                .map(|(i, index)| Prescription::new(format!("{prefix}-rx{i}"), link(index).as_deref()))
                .collect();

            Dataset {
                patients,
                inventory,
                transactions,
                prescriptions,
                ..Dataset::default()
            }
        })
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> bool {
    let mut seen = HashSet::new();
    values.into_iter().all(|value| seen.insert(value))
}

fn keys_unique<T: ContentKeyed>(records: &[T]) -> bool {
    let mut seen = HashSet::new();
    records.iter().all(|record| seen.insert(record.content_key()))
}

fn linked_to_patients<T: HasPatientId>(records: &[T], patient_ids: &HashSet<&str>) -> bool {
    records
        .iter()
        .filter_map(HasPatientId::patient_id)
        .all(|patient_id| patient_ids.contains(patient_id))
}

proptest! {
    #[test]
    fn merged_collections_stay_unique(remote in side("r", true), local in side("l", false)) {
        let merge = merge_datasets(remote, local);
        let merged = &merge.dataset;

        prop_assert!(keys_unique(&merged.patients));
        prop_assert!(keys_unique(&merged.inventory));
        prop_assert!(unique(merged.patients.iter().map(HasId::id)));
        prop_assert!(unique(merged.inventory.iter().map(HasId::id)));
        prop_assert!(unique(merged.transactions.iter().map(HasId::id)));
        prop_assert!(unique(merged.prescriptions.iter().map(HasId::id)));
    }

    #[test]
    fn remote_records_survive_unchanged(remote in side("r", true), local in side("l", false)) {
        let merge = merge_datasets(remote.clone(), local.clone());
        let merged = &merge.dataset;

        prop_assert_eq!(&merged.patients[..remote.patients.len()], &remote.patients[..]);
        prop_assert_eq!(&merged.inventory[..remote.inventory.len()], &remote.inventory[..]);
        prop_assert_eq!(&merged.transactions[..remote.transactions.len()], &remote.transactions[..]);

        let local_keys: HashSet<String> = local.patients.iter().map(ContentKeyed::content_key).collect();
        prop_assert!(merged.patients.len() >= remote.patients.len().max(local_keys.len()));
    }

    #[test]
    fn dependents_point_at_surviving_patients(remote in side("r", true), local in side("l", false)) {
        let merge = merge_datasets(remote, local.clone());
        let merged = &merge.dataset;
        let patient_ids: HashSet<&str> = merged.patients.iter().map(HasId::id).collect();

        prop_assert!(linked_to_patients(&merged.transactions, &patient_ids));
        prop_assert!(linked_to_patients(&merged.prescriptions, &patient_ids));

        for original in &local.transactions {
            let Some(merged_tx) = merged.transactions.iter().find(|tx| tx.id == original.id) else {
                continue;
            };
            let Some(before) = original.patient_id.as_deref() else {
                continue;
            };
            let expected = merge.remap.resolve(before).unwrap_or(before);
            prop_assert_eq!(merged_tx.patient_id.as_deref(), Some(expected));
        }
    }

    #[test]
    fn merging_twice_changes_nothing(remote in side("r", true), local in side("l", false)) {
        let first = merge_datasets(remote, local.clone());
        let second = merge_datasets(first.dataset.clone(), local);

        prop_assert_eq!(second.report.new_items_count, 0);
        prop_assert!(!second.report.has_changes());
        prop_assert_eq!(second.dataset, first.dataset);
    }
}
