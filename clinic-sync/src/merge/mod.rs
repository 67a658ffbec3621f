//! Dataset merging
//!
//! Patients are merged first because their merge produces the remap table
//! every patient-linked collection consumes. Inventory follows, then each
//! linked collection independently, then collections with no foreign key.

pub mod content;
pub mod linked;

pub use content::{merge_by_content_key, merge_inventory, merge_patients, ContentMerge, InventoryMerge};
pub use linked::{merge_by_id, merge_linked, LinkedMerge};

use crate::dataset::Dataset;
use crate::records::{Attributes, HasPatientId};
use crate::remap::RemapTable;
use crate::report::{CollectionReport, MergeReport, PATIENTS};

/// Merged dataset plus what it took to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMerge {
    pub dataset: Dataset,
    pub report: MergeReport,
    pub remap: RemapTable,
}

/// Merge a local snapshot into a remote one.
///
/// Pure and synchronous. Remote records always appear unchanged and ahead
/// of accepted local records. The doctor profile is taken from `remote`
/// only, even when remote has none. Unknown top-level keys keep their
/// remote value; local ones are added only where remote lacks the key.
pub fn merge_datasets(remote: Dataset, local: Dataset) -> DatasetMerge {
    let mut report = MergeReport::default();

    let patients = merge_patients(remote.patients, local.patients);
    report.record(
        PATIENTS,
        CollectionReport {
            new_items: patients.new_count,
            skipped_duplicates: patients.duplicate_count,
            remapped_references: 0,
        },
    );
    let remap = patients.remap;

    let inventory = merge_inventory(remote.inventory, local.inventory);
    report.record(
        "inventory",
        CollectionReport {
            new_items: inventory.new_count,
            skipped_duplicates: inventory.duplicate_count,
            remapped_references: 0,
        },
    );

    let dataset = Dataset {
        patients: patients.merged,
        inventory: inventory.merged,
        transactions: linked(&mut report, "transactions", remote.transactions, local.transactions, &remap),
        soap_notes: linked(&mut report, "soapNotes", remote.soap_notes, local.soap_notes, &remap),
        informed_consents: linked(
            &mut report,
            "informedConsents",
            remote.informed_consents,
            local.informed_consents,
            &remap,
        ),
        declination_letters: linked(
            &mut report,
            "declinationLetters",
            remote.declination_letters,
            local.declination_letters,
            &remap,
        ),
        sick_leaves: linked(&mut report, "sickLeaves", remote.sick_leaves, local.sick_leaves, &remap),
        referral_letters: linked(
            &mut report,
            "referralLetters",
            remote.referral_letters,
            local.referral_letters,
            &remap,
        ),
        prescriptions: linked(
            &mut report,
            "prescriptions",
            remote.prescriptions,
            local.prescriptions,
            &remap,
        ),
        fitness_certificates: linked(
            &mut report,
            "fitnessCertificates",
            remote.fitness_certificates,
            local.fitness_certificates,
            &remap,
        ),
        triage_entries: linked(
            &mut report,
            "triageEntries",
            remote.triage_entries,
            local.triage_entries,
            &remap,
        ),
        inventory_transactions: {
            let merge = merge_by_id(remote.inventory_transactions, local.inventory_transactions);
            report.record(
                "inventoryTransactions",
                CollectionReport {
                    new_items: merge.new_count,
                    ..CollectionReport::default()
                },
            );
            merge.merged
        },
        doctor_profile: remote.doctor_profile,
        extra: merge_extra(remote.extra, local.extra),
    };

    DatasetMerge {
        dataset,
        report,
        remap,
    }
}

fn merge_extra(mut remote: Attributes, local: Attributes) -> Attributes {
    for (key, value) in local {
        remote.entry(key).or_insert(value);
    }
    remote
}

fn linked<T: HasPatientId>(
    report: &mut MergeReport,
    collection: &str,
    remote: Vec<T>,
    local: Vec<T>,
    remap: &RemapTable,
) -> Vec<T> {
    let merge = merge_linked(remote, local, remap);
    report.record(
        collection,
        CollectionReport {
            new_items: merge.new_count,
            skipped_duplicates: 0,
            remapped_references: merge.remapped_count,
        },
    );
    merge.merged
}
