//! # Document Records
//!
//! Typed views of the documents held by the document store. Field names
//! follow the store's camelCase schema; `_id` and `_type` are the store's
//! system fields.

mod car;
mod condition_report;
mod customer;
mod payment;
mod rental;

pub use car::{Car, CarCatalog, ImageRef};
pub use condition_report::ConditionReport;
pub use customer::{Customer, CustomerUpdate};
pub use payment::{Payment, PaymentRecordStatus};
pub use rental::{PaymentStatus, Rental, RentalStatus};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A typed document stored under a fixed `_type`
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Value of the store's `_type` field
    const DOC_TYPE: &'static str;

    /// Human readable name used in not-found errors
    const KIND: &'static str;

    /// The `_id` of this document (empty until created)
    fn id(&self) -> &str;
}

/// Reference from one document to another (`{"_type": "reference", "_ref": id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub id: String,
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
}

fn reference_type() -> String {
    "reference".to_string()
}

impl Reference {
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: reference_type(),
        }
    }
}
