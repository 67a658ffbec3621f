//! Content-addressed merge for patients and inventory batches

use crate::keys::ContentKeyed;
use crate::records::{HasId, InventoryItem, Patient};
use crate::remap::RemapTable;
use std::collections::{HashMap, HashSet};

/// Result of merging one content-keyed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMerge<T> {
    pub merged: Vec<T>,
    /// Local records accepted into the output.
    pub new_count: usize,
    /// Local records collapsed into an existing record with the same key.
    pub duplicate_count: usize,
    pub remap: RemapTable,
}

impl<T> ContentMerge<T> {
    fn passthrough(remote: Vec<T>) -> Self {
        Self {
            merged: remote,
            new_count: 0,
            duplicate_count: 0,
            remap: RemapTable::new(),
        }
    }
}

/// Inventory merge result. Nothing references inventory by foreign key, so
/// no remap table is carried.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryMerge {
    pub merged: Vec<InventoryItem>,
    pub new_count: usize,
    pub duplicate_count: usize,
}

/// Merge `local` into `remote`, collapsing records whose content key is
/// already taken.
///
/// Remote records are kept unchanged and first, in order. Local records are
/// visited once in their original order:
///
/// * an id already present in the output is skipped silently;
/// * a content key already present maps the local id onto the surviving id
///   in the remap table and counts as a duplicate;
/// * anything else is appended and becomes a candidate survivor for later
///   local records, which is what collapses duplicates inside one batch.
///
/// When two remote records share a content key, the first one is the
/// survivor other records map onto.
pub fn merge_by_content_key<T>(remote: Vec<T>, local: Vec<T>) -> ContentMerge<T>
where
    T: HasId + ContentKeyed,
{
    if local.is_empty() {
        return ContentMerge::passthrough(remote);
    }

    let mut survivors_by_key: HashMap<String, String> = HashMap::with_capacity(remote.len());
    let mut surviving_ids: HashSet<String> = HashSet::with_capacity(remote.len() + local.len());
    for record in &remote {
        survivors_by_key
            .entry(record.content_key())
            .or_insert_with(|| record.id().to_string());
        surviving_ids.insert(record.id().to_string());
    }

    let mut merge = ContentMerge::passthrough(remote);

    for record in local {
        if surviving_ids.contains(record.id()) {
            continue;
        }

        let key = record.content_key();
        if let Some(survivor) = survivors_by_key.get(&key) {
            tracing::debug!(
                superseded = record.id(),
                surviving = survivor.as_str(),
                key = %logger_redacted::fingerprint(&key),
                "Collapsed content duplicate"
            );
            merge.remap.record(record.id(), survivor.as_str());
            merge.duplicate_count += 1;
            continue;
        }

        survivors_by_key.insert(key, record.id().to_string());
        surviving_ids.insert(record.id().to_string());
        merge.merged.push(record);
        merge.new_count += 1;
    }

    merge
}

/// Merge patient collections, producing the remap table every dependent
/// collection merge needs.
pub fn merge_patients(remote: Vec<Patient>, local: Vec<Patient>) -> ContentMerge<Patient> {
    merge_by_content_key(remote, local)
}

/// Merge inventory collections by drug name and batch number.
pub fn merge_inventory(remote: Vec<InventoryItem>, local: Vec<InventoryItem>) -> InventoryMerge {
    let ContentMerge {
        merged,
        new_count,
        duplicate_count,
        ..
    } = merge_by_content_key(remote, local);

    InventoryMerge {
        merged,
        new_count,
        duplicate_count,
    }
}
