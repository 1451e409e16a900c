//! # rental-core
//!
//! Core types and traits for the car-rental storefront.
//!
//! This crate provides:
//! - `Car`, `Rental`, `Customer`, `Payment` and `ConditionReport` records
//! - `DocumentStore` trait, an in-memory store and typed `Repository`
//! - `BookingChecker` for date conflicts
//! - `CartStore` for the renter's cart
//! - `PaymentGateway` and `Notifier` traits
//! - `CheckoutOrchestrator` and `PaymentReconciler` for the payment flow
//! - `RentalError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use rental_core::{CartItem, CartStore, CheckoutForm, Identity, MemoryCartStorage};
//!
//! let mut cart = CartStore::open(MemoryCartStorage::new())?;
//! cart.add_to_cart(CartItem::from_car(&car, &period, image_url))?;
//!
//! let outcome = orchestrator
//!     .checkout(&Identity::new(user_id), &form, &mut cart)
//!     .await?;
//!
//! // Redirect the renter to outcome.checkout_url()
//! ```

pub mod booking;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod money;
pub mod notify;
pub mod order;
pub mod period;
pub mod reconcile;
pub mod records;
pub mod repository;
pub mod store;

// Re-exports for convenience
pub use booking::{Availability, BlockingPolicy, BookingChecker, CheckMode};
pub use cart::{CartItem, CartStorage, CartStore, MemoryCartStorage, CART_STORAGE_KEY};
pub use checkout::{CheckoutForm, CheckoutOrchestrator, CheckoutOutcome, Identity};
pub use error::{FieldError, RentalError, RentalResult};
pub use gateway::{CheckoutUrls, PaymentGateway, SharedPaymentGateway};
pub use money::{Amount, Currency, Price};
pub use notify::{confirmation_email, LoggingNotifier, Notifier, SharedNotifier, CONFIRMATION_SUBJECT};
pub use order::{
    CheckoutSession, CheckoutStatus, LineItem, Order, WebhookEvent, WebhookEventType,
    METADATA_RENTAL_ID, METADATA_USER_ID,
};
pub use period::{rental_days, rental_price, RentalPeriod};
pub use reconcile::{PaymentReconciler, WebhookOutcome};
pub use records::{
    Car, CarCatalog, ConditionReport, Customer, CustomerUpdate, ImageRef, Payment,
    PaymentRecordStatus, PaymentStatus, Record, Reference, Rental, RentalStatus,
};
pub use repository::Repository;
pub use store::{DocumentStore, Filter, InMemoryDocumentStore, Query, SharedDocumentStore};
