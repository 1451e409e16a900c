//! # Stripe Checkout Sessions
//!
//! [`PaymentGateway`] implementation over the Stripe Checkout Sessions API.

use crate::config::StripeConfig;
use crate::webhook::{parse_event, verify_signature};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rental_core::{
    CheckoutSession, CheckoutStatus, Order, PaymentGateway, RentalError, RentalResult,
    WebhookEvent,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe hosted checkout gateway
pub struct StripeCheckoutGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutGateway {
    pub fn new(config: StripeConfig) -> RentalResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RentalError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> RentalResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form-encoded body for `POST /v1/checkout/sessions`
    fn form_params(order: &Order, success_url: &str, cancel_url: &str) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
        ];

        for (i, item) in order.line_items.iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            params.push((
                format!("{}[price_data][currency]", prefix),
                item.unit_price.currency.as_str().to_string(),
            ));
            params.push((
                format!("{}[price_data][unit_amount]", prefix),
                item.unit_price
                    .amount
                    .to_minor_units(item.unit_price.currency)
                    .to_string(),
            ));
            params.push((
                format!("{}[price_data][product_data][name]", prefix),
                item.name.clone(),
            ));
            if let Some(desc) = &item.description {
                params.push((
                    format!("{}[price_data][product_data][description]", prefix),
                    desc.clone(),
                ));
            }
            if let Some(url) = &item.image_url {
                params.push((
                    format!("{}[price_data][product_data][images][0]", prefix),
                    url.clone(),
                ));
            }
            params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
        }

        if let Some(email) = &order.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }

        params.push(("metadata[order_id]".to_string(), order.id.clone()));
        let mut metadata: Vec<_> = order.metadata.iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        params
    }

    async fn read_response(response: reqwest::Response) -> RentalResult<StripeSessionResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        if !status.is_success() {
            error!(%status, body = %body, "Stripe API error");
            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(RentalError::Gateway {
                provider: PROVIDER.to_string(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            RentalError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_checkout(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> RentalResult<CheckoutSession> {
        if order.is_empty() {
            return Err(RentalError::InvalidRequest("Order has no items".to_string()));
        }

        let params = Self::form_params(order, success_url, cancel_url);
        debug!(items = order.line_items.len(), "Creating Stripe checkout session");

        let idempotency_key = order
            .idempotency_key
            .clone()
            .unwrap_or_else(|| order.id.clone());

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base_url))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        let session = Self::read_response(response).await?;
        info!(session_id = %session.id, "Created Stripe checkout session");

        Ok(session.into_checkout_session(order.id.clone()))
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> RentalResult<CheckoutSession> {
        validate_session_id(session_id)?;
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.config.api_base_url, session_id
            ))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RentalError::not_found("Checkout session", session_id));
        }

        let session = Self::read_response(response).await?;
        let order_id = session.metadata.get("order_id").cloned().unwrap_or_default();
        Ok(session.into_checkout_session(order_id))
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> RentalResult<WebhookEvent> {
        verify_signature(&self.config.webhook_secret, payload, signature, Utc::now())?;
        parse_event(payload)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Session ids go into the URL path, so only accept `cs_` plus `[A-Za-z0-9_]`
fn validate_session_id(session_id: &str) -> RentalResult<()> {
    let valid = session_id
        .strip_prefix("cs_")
        .is_some_and(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(RentalError::InvalidRequest(
            "Invalid checkout session id".to_string(),
        ))
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

impl StripeSessionResponse {
    fn into_checkout_session(self, order_id: String) -> CheckoutSession {
        let mut session = CheckoutSession::new(self.id, order_id, PROVIDER, self.url.unwrap_or_default());
        session.status = match self.status.as_deref() {
            Some("complete") => CheckoutStatus::Complete,
            Some("expired") => CheckoutStatus::Expired,
            _ => CheckoutStatus::Open,
        };
        session.payment_status = self.payment_status;
        session.payment_intent_id = self.payment_intent;
        session.amount_total = self.amount_total;
        session.customer_email = self.customer_details.and_then(|cd| cd.email);
        session.expires_at = self.expires_at.and_then(|ts| DateTime::from_timestamp(ts, 0));
        session.metadata = self.metadata;
        session
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
