//! # Payment Gateway Trait
//!
//! Strategy trait for hosted-checkout payment providers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  PaymentGateway (trait)                     │
//! │  ├── create_checkout()                                      │
//! │  ├── retrieve_session()                                     │
//! │  ├── verify_webhook()                                       │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │StripeCheckout │
//!                    │   Gateway     │
//!                    └───────────────┘
//! ```

use crate::error::RentalResult;
use crate::order::{CheckoutSession, Order, WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Payment provider operations used by checkout and reconciliation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for `order`.
    ///
    /// `success_url` may contain the provider's session-id placeholder.
    async fn create_checkout(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> RentalResult<CheckoutSession>;

    /// Look up a session by id (used by the success page)
    async fn retrieve_session(&self, session_id: &str) -> RentalResult<CheckoutSession>;

    /// Verify a webhook signature and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> RentalResult<WebhookEvent>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Shared gateway handle
pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

/// Redirect targets for the hosted checkout page
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the storefront (e.g., "https://rentals.example.com")
    pub base_url: String,
    pub success_path: String,
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    /// Success URL carrying Stripe's session id placeholder
    pub fn success_url_with_session(&self) -> String {
        format!("{}?session_id={{CHECKOUT_SESSION_ID}}", self.success_url())
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
