use super::{Record, Reference};
use crate::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a payment attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentRecordStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A payment against a rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub rental: Reference,

    pub amount: Amount,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Gateway payment intent (or session) identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    #[serde(default)]
    pub status: PaymentRecordStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Record for Payment {
    const DOC_TYPE: &'static str = "payment";
    const KIND: &'static str = "Payment";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Payment {
    /// A completed payment confirmed by the gateway
    pub fn completed(
        rental_id: impl Into<String>,
        amount: Amount,
        currency: impl Into<String>,
        payment_intent_id: Option<String>,
    ) -> Self {
        Self {
            id: String::new(),
            rental: Reference::to(rental_id),
            amount,
            currency: currency.into(),
            payment_intent_id,
            status: PaymentRecordStatus::Completed,
            payment_method: Some("stripe_checkout".to_string()),
            timestamp: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_defaults() {
        let payment: Payment = serde_json::from_value(json!({
            "rental": {"_ref": "r1"},
            "amount": 120.5
        }))
        .unwrap();

        assert_eq!(payment.currency, "USD");
        assert_eq!(payment.status, PaymentRecordStatus::Pending);
        assert_eq!(payment.amount.cents(), 12050);
    }

    #[test]
    fn test_completed_payment() {
        let payment = Payment::completed("r1", Amount::from_cents(9900), "USD", Some("pi_1".into()));
        assert_eq!(payment.status, PaymentRecordStatus::Completed);
        assert_eq!(payment.rental.id, "r1");
        assert!(payment.timestamp.is_some());
    }
}
