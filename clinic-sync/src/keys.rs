//! Content key derivation
//!
//! A content key identifies a record by what it describes rather than by
//! its surrogate id. Two records created independently on different
//! devices for the same person (or the same physical batch) end up with
//! different ids but identical content keys.
//!
//! Keys are computed identically on every side of a merge: the name part
//! is trimmed and lowercased, the second part is taken verbatim, and
//! missing fields count as the empty string.

/// Separator between the two key components.
const KEY_SEPARATOR: char = '|';

/// Records that can be identified by content.
pub trait ContentKeyed {
    fn content_key(&self) -> String;
}

/// Identity key for a patient: normalized name plus date of birth.
pub fn patient_key(name: Option<&str>, date_of_birth: Option<&str>) -> String {
    compose(name, date_of_birth)
}

/// Identity key for an inventory batch: normalized drug name plus batch number.
pub fn inventory_key(drug_name: Option<&str>, batch_number: Option<&str>) -> String {
    compose(drug_name, batch_number)
}

fn compose(label: Option<&str>, qualifier: Option<&str>) -> String {
    let label = label.unwrap_or_default().trim().to_lowercase();
    let qualifier = qualifier.unwrap_or_default();

    let mut key = String::with_capacity(label.len() + qualifier.len() + 1);
    key.push_str(&label);
    key.push(KEY_SEPARATOR);
    key.push_str(qualifier);
    key
}
