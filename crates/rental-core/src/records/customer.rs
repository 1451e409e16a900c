use super::Record;
use serde::{Deserialize, Serialize};

/// A renter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: String,

    /// User id at the external identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clerk_id: Option<String>,
}

impl Record for Customer {
    const DOC_TYPE: &'static str = "customer";
    const KIND: &'static str = "Customer";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update for `PUT /customers/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clerk_id: Option<String>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        *self == CustomerUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = CustomerUpdate {
            phone: Some("03001234567".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"phone": "03001234567"})
        );
        assert!(!update.is_empty());
        assert!(CustomerUpdate::default().is_empty());
    }

    #[test]
    fn test_update_ignores_system_fields() {
        let update: CustomerUpdate =
            serde_json::from_value(json!({"_id": "other", "name": "Ayesha"})).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"name": "Ayesha"})
        );
    }
}
