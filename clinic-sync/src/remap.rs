//! Identifier remap table
//!
//! Built while merging patients: each local patient that turned out to be a
//! content duplicate of a surviving patient gets an entry pointing at the
//! survivor. Every dependent collection merge reads the finished table to
//! relink its `patientId` foreign keys.

use std::collections::HashMap;

/// Superseded id -> surviving id, scoped to one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    entries: HashMap<String, String>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `superseded` duplicates `surviving`.
    ///
    /// The first mapping for a given id wins; returns `false` when the id was
    /// already mapped and the call was ignored.
    pub fn record(&mut self, superseded: impl Into<String>, surviving: impl Into<String>) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.entry(superseded.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(surviving.into());
                true
            }
        }
    }

    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
