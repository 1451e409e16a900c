//! # Order Types
//!
//! Orders handed to the payment gateway, the checkout sessions it returns,
//! and the normalized webhook events it sends back.

use crate::cart::CartItem;
use crate::money::{Amount, Currency, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the rental document id through the gateway
pub const METADATA_RENTAL_ID: &str = "rentalId";
/// Metadata key carrying the renter's identity through the gateway
pub const METADATA_USER_ID: &str = "userId";

/// A line item in an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Car ID
    pub car_id: String,

    /// Car name (denormalized for display)
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price of the whole rental period for this car
    pub unit_price: Price,

    pub quantity: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    /// One line per cart entry, priced at the entry's total
    pub fn from_cart_item(item: &CartItem, currency: Currency) -> Self {
        let days = crate::period::rental_days(item.rental_start_date, item.rental_end_date);
        Self {
            car_id: item.id.clone(),
            name: item.name.clone(),
            description: Some(format!(
                "{} to {} ({} day{})",
                item.rental_start_date.format("%Y-%m-%d"),
                item.rental_end_date.format("%Y-%m-%d"),
                days,
                if days == 1 { "" } else { "s" }
            )),
            unit_price: Price::new(item.total_price, currency),
            quantity: 1,
            image_url: Some(item.image.clone()).filter(|url| url.starts_with("http")),
        }
    }

    pub fn total(&self) -> Amount {
        self.unit_price.amount * i64::from(self.quantity)
    }
}

/// An order to be checked out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated)
    pub id: String,

    pub line_items: Vec<LineItem>,

    /// Currency (must be same for all items)
    pub currency: Currency,

    /// Customer email (optional, for prefill)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Idempotency key (prevents duplicate sessions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    /// Echoed back by the gateway on the completion webhook
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with generated ID
    pub fn new(currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            line_items: Vec::new(),
            currency,
            customer_email: None,
            idempotency_key: Some(Uuid::new_v4().to_string()),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Order with one line per cart item
    pub fn from_cart(items: &[CartItem], currency: Currency) -> Self {
        let mut order = Self::new(currency);
        for item in items {
            order.add_item(LineItem::from_cart_item(item, currency));
        }
        order
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    pub fn total(&self) -> Price {
        Price::new(self.line_items.iter().map(LineItem::total).sum(), self.currency)
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Status of a checkout session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Session created, awaiting payment
    #[default]
    Open,
    /// Checkout completed
    Complete,
    /// Session expired
    Expired,
}

/// A checkout session created by a payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Gateway's session ID
    pub session_id: String,

    /// Our internal order ID
    pub order_id: String,

    /// Gateway name (e.g., "stripe")
    pub provider: String,

    /// Hosted payment page to redirect the renter to
    pub checkout_url: String,

    #[serde(default)]
    pub status: CheckoutStatus,

    /// Gateway payment status ("paid", "unpaid", "no_payment_required")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,

    /// Amount total in the currency's smallest unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(
        session_id: impl Into<String>,
        order_id: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            order_id: order_id.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            status: CheckoutStatus::Open,
            payment_status: None,
            amount_total: None,
            customer_email: None,
            expires_at: None,
            payment_intent_id: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Check if session is still valid
    pub fn is_active(&self) -> bool {
        matches!(self.status, CheckoutStatus::Open)
            && self.expires_at.map(|exp| exp > Utc::now()).unwrap_or(true)
    }
}

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    CheckoutCompleted,
    CheckoutExpired,
    PaymentSucceeded,
    PaymentFailed,
    RefundIssued,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified, normalized webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from the gateway
    pub event_id: String,

    pub event_type: WebhookEventType,

    pub provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Amount paid (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,

    /// Metadata attached to the order at checkout
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Raw event data (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}

impl WebhookEvent {
    /// Event with only the identifying fields set
    pub fn new(event_id: impl Into<String>, event_type: WebhookEventType, provider: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type,
            provider: provider.into(),
            session_id: None,
            payment_intent_id: None,
            payment_status: None,
            customer_email: None,
            amount_paid: None,
            currency: None,
            metadata: HashMap::new(),
            raw_data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
