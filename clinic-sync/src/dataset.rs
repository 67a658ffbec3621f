//! The full clinic dataset snapshot

use crate::records::{
    Attributes, DeclinationLetter, DoctorProfile, FitnessCertificate, InformedConsent, InventoryItem,
    InventoryTransaction, Patient, Prescription, ReferralLetter, SickLeave, SoapNote, Transaction,
    TriageEntry,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Point-in-time copy of every collection held by one store.
///
/// Missing or `null` collections deserialize as empty so that snapshots
/// written by older or newer app versions still load. Top-level keys this
/// crate does not know are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patients: Vec<Patient>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inventory: Vec<InventoryItem>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub soap_notes: Vec<SoapNote>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub informed_consents: Vec<InformedConsent>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub declination_letters: Vec<DeclinationLetter>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sick_leaves: Vec<SickLeave>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub referral_letters: Vec<ReferralLetter>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prescriptions: Vec<Prescription>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fitness_certificates: Vec<FitnessCertificate>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub triage_entries: Vec<TriageEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inventory_transactions: Vec<InventoryTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_profile: Option<DoctorProfile>,
    #[serde(flatten)]
    pub extra: Attributes,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregate counts used by the sync-safety gate and in logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub patients: usize,
    pub transactions: usize,
    pub total_records: usize,
}

impl Dataset {
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            patients: self.patients.len(),
            transactions: self.transactions.len(),
            total_records: self.total_records(),
        }
    }

    /// Number of records across every collection.
    pub fn total_records(&self) -> usize {
        self.patients.len()
            + self.inventory.len()
            + self.transactions.len()
            + self.soap_notes.len()
            + self.informed_consents.len()
            + self.declination_letters.len()
            + self.sick_leaves.len()
            + self.referral_letters.len()
            + self.prescriptions.len()
            + self.fitness_certificates.len()
            + self.triage_entries.len()
            + self.inventory_transactions.len()
    }

    /// True when no collection holds a record and there is no doctor profile.
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0 && self.doctor_profile.is_none()
    }

    pub fn from_json(raw: &str) -> crate::SyncResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> crate::SyncResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
