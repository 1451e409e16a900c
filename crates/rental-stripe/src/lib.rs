//! # rental-stripe
//!
//! Stripe payment gateway for the car-rental storefront.
//!
//! Uses Stripe Checkout Sessions: the renter is redirected to Stripe's hosted
//! page and the result comes back through a signed
//! `checkout.session.completed` webhook.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rental_stripe::StripeCheckoutGateway;
//! use rental_core::PaymentGateway;
//!
//! let gateway = StripeCheckoutGateway::from_env()?;
//!
//! let session = gateway
//!     .create_checkout(&order, &urls.success_url_with_session(), &urls.cancel_url())
//!     .await?;
//!
//! // Redirect the renter to session.checkout_url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! let event = gateway.verify_webhook(payload, signature_header).await?;
//! // event.metadata carries the rentalId and userId set at checkout
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutGateway;
pub use config::StripeConfig;
pub use webhook::{parse_event, sign_payload, verify_signature, REQUIRED_WEBHOOK_EVENTS};
