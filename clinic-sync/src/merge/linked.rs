//! Identity merge for collections that reference patients

use crate::records::{HasId, HasPatientId};
use crate::remap::RemapTable;
use std::collections::HashSet;

/// Result of merging one dependent collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedMerge<T> {
    pub merged: Vec<T>,
    pub new_count: usize,
    /// Accepted local records whose `patientId` was redirected to a survivor.
    pub remapped_count: usize,
}

/// Merge a patient-linked collection by id, relinking accepted local records
/// through `remap`.
///
/// Remote records are assumed consistent and are never rewritten. The remap
/// table is required: it only exists once the patient merge has finished,
/// which pins the order of a reconciliation run.
pub fn merge_linked<T>(remote: Vec<T>, local: Vec<T>, remap: &RemapTable) -> LinkedMerge<T>
where
    T: HasPatientId,
{
    let (mut merged, accepted) = merge_ids(remote, local);
    let mut remapped_count = 0;

    let first_local = merged.len().saturating_sub(accepted);
    for record in merged.iter_mut().skip(first_local) {
        let target = record
            .patient_id()
            .and_then(|patient_id| remap.resolve(patient_id))
            .map(str::to_string);

        if let Some(target) = target {
            record.set_patient_id(target);
            remapped_count += 1;
        }
    }

    LinkedMerge {
        merged,
        new_count: accepted,
        remapped_count,
    }
}

/// Merge by id alone, for collections with no foreign key to relink.
pub fn merge_by_id<T>(remote: Vec<T>, local: Vec<T>) -> LinkedMerge<T>
where
    T: HasId,
{
    let (merged, accepted) = merge_ids(remote, local);
    LinkedMerge {
        merged,
        new_count: accepted,
        remapped_count: 0,
    }
}

/// Remote first, then every local record whose id is not yet present.
/// Returns the merged list and how many local records were appended.
fn merge_ids<T: HasId>(remote: Vec<T>, local: Vec<T>) -> (Vec<T>, usize) {
    if local.is_empty() {
        return (remote, 0);
    }

    let mut seen: HashSet<String> = remote.iter().map(|r| r.id().to_string()).collect();
    let mut merged = remote;
    merged.reserve(local.len());

    let mut accepted = 0;
    for record in local {
        if seen.insert(record.id().to_string()) {
            merged.push(record);
            accepted += 1;
        }
    }

    (merged, accepted)
}
