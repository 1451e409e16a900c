use super::{ConditionReport, Record, Reference};
use crate::money::Amount;
use crate::period::RentalPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fulfilment state of a rental
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "ongoing")]
    Ongoing,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled")]
    Cancelled,
}

/// Payment state of a rental. Only webhook reconciliation moves it to `Paid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "unpaid")]
    Unpaid,
    #[serde(alias = "paid")]
    Paid,
    #[serde(rename = "Partially Paid", alias = "partially_paid")]
    PartiallyPaid,
}

/// A booking linking a car, a customer and a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub car: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Reference>,

    /// Identity-provider user id of the renter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    /// Billable days
    pub duration: i64,

    /// Refundable deposit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<Amount>,

    pub total_price: Amount,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_report: Option<ConditionReport>,

    #[serde(default)]
    pub status: RentalStatus,

    #[serde(default)]
    pub payment_status: PaymentStatus,
}

impl Record for Rental {
    const DOC_TYPE: &'static str = "rental";
    const KIND: &'static str = "Rental";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Rental {
    /// A new rental awaiting payment. This is the only state a rental is
    /// ever created in.
    pub fn pending(
        car_id: impl Into<String>,
        user_id: Option<String>,
        period: RentalPeriod,
        total_price: Amount,
    ) -> Self {
        Self {
            id: String::new(),
            car: Reference::to(car_id),
            customer: None,
            user_id,
            start_date: period.start(),
            end_date: period.end(),
            duration: period.days(),
            deposit: None,
            total_price,
            condition_report: None,
            status: RentalStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
        }
    }

    /// Builder: link a customer document
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer = Some(Reference::to(customer_id));
        self
    }

    /// Builder: set deposit
    pub fn with_deposit(mut self, deposit: Amount) -> Self {
        self.deposit = Some(deposit);
        self
    }

    pub fn car_id(&self) -> &str {
        &self.car.id
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
