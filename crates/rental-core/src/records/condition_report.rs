use super::{ImageRef, Record, Reference};
use serde::{Deserialize, Serialize};

/// Vehicle condition before and after a rental.
///
/// Stored either standalone (`_type: conditionReport`, with a rental
/// reference) or embedded in a rental document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionReport {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_rental: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_rental: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_photos: Vec<ImageRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_photos: Vec<ImageRef>,
}

impl Record for ConditionReport {
    const DOC_TYPE: &'static str = "conditionReport";
    const KIND: &'static str = "Condition report";

    fn id(&self) -> &str {
        &self.id
    }
}
