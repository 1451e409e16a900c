//! # rental-api
//!
//! HTTP API layer for the car-rental storefront.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the catalog, customers, rentals and payments
//! - Checkout and webhook handlers for the payment flow
//! - Resend-backed confirmation email
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET/POST | `/api/v1/cars` | List / add cars |
//! | GET | `/api/v1/cars/{id}` | Get car |
//! | GET | `/api/v1/cars/{id}/availability` | Blocked days for a car |
//! | POST | `/api/v1/cars/{id}/availability` | Check a date range |
//! | GET/POST | `/api/v1/customers` | List / create customers |
//! | GET | `/api/v1/customers/me` | Customer for `x-user-id` |
//! | GET/PUT/DELETE | `/api/v1/customers/{id}` | Customer CRUD |
//! | GET | `/api/v1/rentals?userId=` | A user's rentals |
//! | POST | `/api/v1/rentals` | Book one car |
//! | GET | `/api/v1/rentals/{id}` | Get rental |
//! | POST | `/api/v1/payments` | Record payment |
//! | GET | `/api/v1/payments/{id}` | Get payment |
//! | POST | `/api/v1/checkout` | Check out a cart |
//! | GET | `/api/v1/checkout/session?session_id=` | Checkout session |
//! | POST | `/api/v1/send-email` | Confirmation email |
//! | GET/POST | `/api/v1/condition-reports` | List / create reports |
//! | GET | `/api/v1/condition-reports/{id}` | Get report |
//! | POST | `/webhooks` | Payment gateway webhook |
//!
//! Identity comes from the `x-user-id` (and optional `x-user-email`) header
//! set by the identity provider in front of this service.

pub mod handlers;
pub mod mailer;
pub mod routes;
pub mod state;

pub use mailer::ResendNotifier;
pub use routes::create_router;
pub use state::{AppConfig, AppState, ConfigError, LogFormat, StoreBackend};
