//! Merge statistics handed back to callers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Report key of the hub collection, whose new records are the headline count.
pub const PATIENTS: &str = "patients";

/// Counts for a single collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub new_items: usize,
    pub skipped_duplicates: usize,
    pub remapped_references: usize,
}

/// Everything a caller needs to summarize a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// New patients accepted from local.
    pub new_items_count: usize,
    pub skipped_duplicates: usize,
    pub remapped_references: usize,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionReport>,
}

impl MergeReport {
    pub fn record(&mut self, collection: &str, counts: CollectionReport) {
        if collection == PATIENTS {
            self.new_items_count += counts.new_items;
        }
        self.skipped_duplicates += counts.skipped_duplicates;
        self.remapped_references += counts.remapped_references;
        self.collections.insert(collection.to_string(), counts);
    }

    /// Local records accepted into any collection.
    pub fn new_records(&self) -> usize {
        self.collections.values().map(|counts| counts.new_items).sum()
    }

    /// True when the merge produced something the remote store lacks.
    pub fn has_changes(&self) -> bool {
        self.new_records() + self.remapped_references > 0
    }

    /// One-line human readable summary, e.g.
    /// "3 new patients merged, 1 duplicate skipped, 2 records relinked".
    pub fn summary(&self) -> String {
        format!(
            "{} merged, {} skipped, {} relinked",
            plural(self.new_items_count, "new patient", "new patients"),
            plural(self.skipped_duplicates, "duplicate", "duplicates"),
            plural(self.remapped_references, "record", "records"),
        )
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_aggregates_totals() {
        let mut report = MergeReport::default();
        report.record(
            "patients",
            CollectionReport {
                new_items: 3,
                skipped_duplicates: 1,
                remapped_references: 0,
            },
        );
        report.record(
            "transactions",
            CollectionReport {
                new_items: 2,
                skipped_duplicates: 0,
                remapped_references: 2,
            },
        );

        assert_eq!(report.new_items_count, 3);
        assert_eq!(report.new_records(), 5);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.remapped_references, 2);
        assert_eq!(report.collections.len(), 2);
        assert!(report.has_changes());
    }

    #[test]
    fn test_duplicates_alone_are_not_changes() {
        let mut report = MergeReport::default();
        report.record(
            "inventory",
            CollectionReport {
                skipped_duplicates: 4,
                ..CollectionReport::default()
            },
        );
        assert!(!report.has_changes());
    }

    #[test]
    fn test_new_dependent_records_are_changes() {
        let mut report = MergeReport::default();
        report.record(
            "prescriptions",
            CollectionReport {
                new_items: 1,
                ..CollectionReport::default()
            },
        );
        assert_eq!(report.new_items_count, 0);
        assert!(report.has_changes());
    }

    #[test]
    fn test_summary_wording() {
        let report = MergeReport {
            new_items_count: 3,
            skipped_duplicates: 1,
            remapped_references: 2,
            collections: BTreeMap::new(),
        };
        assert_eq!(
            report.summary(),
            "3 new patients merged, 1 duplicate skipped, 2 records relinked"
        );
    }
}
