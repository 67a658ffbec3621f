//! Record types carried by a clinic dataset
//!
//! Only the fields that take part in reconciliation are typed. Everything
//! else a record holds lives in its flattened `attributes` map, so a
//! snapshot survives load -> merge -> save without losing fields this crate
//! knows nothing about.

use crate::keys::{inventory_key, patient_key, ContentKeyed};
use serde::{Deserialize, Serialize};

/// Untyped record attributes preserved verbatim.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Records with a collection-unique surrogate id.
pub trait HasId {
    fn id(&self) -> &str;
}

/// Records that may point at a patient by id.
pub trait HasPatientId: HasId {
    fn patient_id(&self) -> Option<&str>;

    fn set_patient_id(&mut self, patient_id: String);
}

/// Hub entity of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Patient {
    pub fn new(id: impl Into<String>, name: &str, date_of_birth: &str) -> Self {
        Self {
            id: id.into(),
            name: Some(name.to_string()),
            date_of_birth: Some(date_of_birth.to_string()),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

impl HasId for Patient {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ContentKeyed for Patient {
    fn content_key(&self) -> String {
        patient_key(self.name.as_deref(), self.date_of_birth.as_deref())
    }
}

/// One physical batch of stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl InventoryItem {
    pub fn new(id: impl Into<String>, drug_name: &str, batch_number: &str) -> Self {
        Self {
            id: id.into(),
            drug_name: Some(drug_name.to_string()),
            batch_number: Some(batch_number.to_string()),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

impl HasId for InventoryItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ContentKeyed for InventoryItem {
    fn content_key(&self) -> String {
        inventory_key(self.drug_name.as_deref(), self.batch_number.as_deref())
    }
}

/// Stock movement; merged by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl InventoryTransaction {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }
}

impl HasId for InventoryTransaction {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Practice configuration singleton. Never merged by content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Declare a record type that hangs off a patient through `patientId`.
macro_rules! linked_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub id: String,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub patient_id: Option<String>,
            #[serde(flatten)]
            pub attributes: Attributes,
        }

        impl $name {
            pub fn new(id: impl Into<String>, patient_id: Option<&str>) -> Self {
                Self {
                    id: id.into(),
                    patient_id: patient_id.map(str::to_string),
                    attributes: Attributes::new(),
                }
            }

            pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
                self.attributes.insert(key.to_string(), value.into());
                self
            }
        }

        impl HasId for $name {
            fn id(&self) -> &str {
                &self.id
            }
        }

        impl HasPatientId for $name {
            fn patient_id(&self) -> Option<&str> {
                self.patient_id.as_deref()
            }

            fn set_patient_id(&mut self, patient_id: String) {
                self.patient_id = Some(patient_id);
            }
        }
    };
}

linked_record!(
    /// Billing entry for a visit.
    Transaction
);
linked_record!(
    /// SOAP clinical note.
    SoapNote
);
linked_record!(InformedConsent);
linked_record!(DeclinationLetter);
linked_record!(SickLeave);
linked_record!(ReferralLetter);
linked_record!(Prescription);
linked_record!(FitnessCertificate);
linked_record!(
    /// Waiting-room queue entry.
    TriageEntry
);
