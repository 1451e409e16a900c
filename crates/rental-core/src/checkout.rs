//! # Checkout Orchestrator
//!
//! Turns a validated cart into a pending rental and a hosted checkout
//! session.
//!
//! ```text
//! validate form ─► validate + reprice cart ─► create Rental (Pending/Unpaid)
//!                                                      │
//!            clear cart ◄─ checkout URL ◄──────────────┴─ gateway.create_checkout
//!                 │
//!                 └─► confirmation email (best-effort)
//! ```
//!
//! Payment confirmation happens later, through
//! [`crate::reconcile::PaymentReconciler`].

use crate::cart::{CartItem, CartStorage, CartStore};
use crate::error::{FieldError, RentalError, RentalResult};
use crate::gateway::{CheckoutUrls, SharedPaymentGateway};
use crate::money::{Amount, Currency};
use crate::notify::{confirmation_email, SharedNotifier, CONFIRMATION_SUBJECT};
use crate::order::{CheckoutSession, Order, METADATA_RENTAL_ID, METADATA_USER_ID};
use crate::records::{Car, Customer, Rental};
use crate::repository::Repository;
use crate::store::{Query, SharedDocumentStore};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Caller identity supplied by the upstream identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

fn default_payment_method() -> String {
    "creditCard".to_string()
}

/// Billing and rental details entered on the payment page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub dropoff_location: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

impl CheckoutForm {
    /// Check every field, reporting all failures together
    pub fn validate(&self) -> RentalResult<()> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if self.phone.chars().count() < 10 {
            errors.push(FieldError::new(
                "phone",
                "Phone number must be at least 10 digits",
            ));
        }
        if self.phone.is_empty() || !self.phone.chars().all(|c| c.is_ascii_digit()) {
            errors.push(FieldError::new(
                "phone",
                "Phone number must contain only digits",
            ));
        }
        if self.address.trim().is_empty() {
            errors.push(FieldError::new("address", "Address is required"));
        }
        if self.city.trim().is_empty() {
            errors.push(FieldError::new("city", "City is required"));
        }
        if self.pickup_location.trim().is_empty() {
            errors.push(FieldError::new(
                "pickupLocation",
                "Pickup location is required",
            ));
        }
        if self.dropoff_location.trim().is_empty() {
            errors.push(FieldError::new(
                "dropoffLocation",
                "Dropoff location is required",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(errors))
        }
    }
}

/// A successful checkout: the pending rental and where to send the renter
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub rental: Rental,
    pub session: CheckoutSession,
    /// Cart contents at checkout time
    pub items: Vec<CartItem>,
}

impl CheckoutOutcome {
    pub fn checkout_url(&self) -> &str {
        &self.session.checkout_url
    }
}

/// Rental details included in the confirmation email
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationDetails<'a> {
    rental_id: &'a str,
    items: &'a [CartItem],
    total_price: Amount,
    pickup_location: &'a str,
    dropoff_location: &'a str,
}

/// Runs the checkout flow against the document store and payment gateway
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    cars: Repository<Car>,
    rentals: Repository<Rental>,
    customers: Repository<Customer>,
    gateway: SharedPaymentGateway,
    notifier: SharedNotifier,
    urls: CheckoutUrls,
    currency: Currency,
}

impl CheckoutOrchestrator {
    pub fn new(
        store: SharedDocumentStore,
        gateway: SharedPaymentGateway,
        notifier: SharedNotifier,
        urls: CheckoutUrls,
        currency: Currency,
    ) -> Self {
        Self {
            cars: Repository::new(store.clone()),
            rentals: Repository::new(store.clone()),
            customers: Repository::new(store),
            gateway,
            notifier,
            urls,
            currency,
        }
    }

    /// Check out `cart` for `identity`.
    ///
    /// Items are charged at the catalog's current `pricePerDay`. Nothing is
    /// written if validation fails. If the gateway call fails the rental
    /// stays Pending/Unpaid and the cart is kept.
    #[instrument(skip(self, form, cart), fields(user_id = %identity.user_id, items = cart.len()))]
    pub async fn checkout<S: CartStorage>(
        &self,
        identity: &Identity,
        form: &CheckoutForm,
        cart: &mut CartStore<S>,
    ) -> RentalResult<CheckoutOutcome> {
        form.validate()?;

        for item in cart.items() {
            item.validate()?;
        }
        let items = self.price_from_catalog(cart.items()).await?;
        let first = items
            .first()
            .ok_or_else(|| RentalError::InvalidRequest("Cart is empty".to_string()))?;

        let period = first.period()?;
        let total: Amount = items.iter().map(|item| item.total_price).sum();
        let mut rental = Rental::pending(&first.id, Some(identity.user_id.clone()), period, total);
        if let Some(customer) = self.find_customer(&identity.user_id).await? {
            rental = rental.with_customer(customer.id);
        }

        let rental = self.rentals.create(&rental).await?;
        info!(rental_id = %rental.id, total = total.as_major(), "Pending rental created");

        let mut order = Order::from_cart(&items, self.currency)
            .with_idempotency_key(rental.id.clone())
            .with_metadata(METADATA_RENTAL_ID, rental.id.clone())
            .with_metadata(METADATA_USER_ID, identity.user_id.clone());
        if let Some(email) = &identity.email {
            order = order.with_email(email.clone());
        }

        let session = match self
            .gateway
            .create_checkout(&order, &self.urls.success_url_with_session(), &self.urls.cancel_url())
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!(
                    rental_id = %rental.id,
                    provider = self.gateway.provider_name(),
                    error = %e,
                    "Checkout session failed; rental left pending"
                );
                return Err(e);
            }
        };

        cart.clear_cart()?;

        info!(
            rental_id = %rental.id,
            session_id = %session.session_id,
            "Checkout session created"
        );

        self.send_confirmation(identity, form, &rental, &items).await;

        Ok(CheckoutOutcome {
            rental,
            session,
            items,
        })
    }

    /// Reprice every item with its car's catalog price
    async fn price_from_catalog(&self, items: &[CartItem]) -> RentalResult<Vec<CartItem>> {
        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            let car = self.cars.get(&item.id).await?;
            if car.price_per_day != item.price_per_day {
                warn!(
                    car_id = %car.id,
                    cart_price = item.price_per_day.as_major(),
                    catalog_price = car.price_per_day.as_major(),
                    "Cart price differs from catalog"
                );
            }
            let period = item.period()?;
            priced.push(CartItem {
                price_per_day: car.price_per_day,
                total_price: period.price(car.price_per_day),
                ..item.clone()
            });
        }
        Ok(priced)
    }

    async fn find_customer(&self, user_id: &str) -> RentalResult<Option<Customer>> {
        let matches = self
            .customers
            .find(Query::of_type("customer").filter("clerkId", user_id))
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn send_confirmation(
        &self,
        identity: &Identity,
        form: &CheckoutForm,
        rental: &Rental,
        items: &[CartItem],
    ) {
        let Some(to) = identity.email.as_deref() else {
            info!(rental_id = %rental.id, "No email on identity; confirmation skipped");
            return;
        };

        let details = ConfirmationDetails {
            rental_id: &rental.id,
            items,
            total_price: rental.total_price,
            pickup_location: &form.pickup_location,
            dropoff_location: &form.dropoff_location,
        };
        let result = match confirmation_email(&details) {
            Ok(html) => self.notifier.send_email(to, CONFIRMATION_SUBJECT, &html).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(
                rental_id = %rental.id,
                notifier = self.notifier.notifier_name(),
                error = %e,
                "Confirmation email failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::notify::Notifier;
    use crate::order::WebhookEvent;
    use crate::period::RentalPeriod;
    use crate::records::{CarCatalog, PaymentStatus, RentalStatus};
    use crate::store::{DocumentStore, InMemoryDocumentStore};
    use crate::PaymentGateway;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeGateway {
        fail: bool,
        orders: Mutex<Vec<Order>>,
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout(
            &self,
            order: &Order,
            success_url: &str,
            _cancel_url: &str,
        ) -> RentalResult<CheckoutSession> {
            if self.fail {
                return Err(RentalError::Gateway {
                    provider: "fake".into(),
                    message: "card network down".into(),
                });
            }
            assert!(success_url.contains("{CHECKOUT_SESSION_ID}"));
            self.orders.lock().unwrap().push(order.clone());
            Ok(CheckoutSession::new("cs_test_1", &order.id, "fake", "https://pay.example/cs_test_1"))
        }

        async fn retrieve_session(&self, session_id: &str) -> RentalResult<CheckoutSession> {
            Err(RentalError::not_found("Checkout session", session_id))
        }

        async fn verify_webhook(&self, _payload: &[u8], _signature: &str) -> RentalResult<WebhookEvent> {
            Err(RentalError::WebhookVerificationFailed("unsupported".into()))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_email(&self, to: &str, _subject: &str, _html: &str) -> RentalResult<()> {
            if self.fail {
                return Err(RentalError::Notification("mailbox full".into()));
            }
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }

        fn notifier_name(&self) -> &'static str {
            "recording"
        }
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            name: "Fatima Khan".into(),
            phone: "03001234567".into(),
            address: "22 Jail Road".into(),
            city: "Lahore".into(),
            pickup_location: "Lahore".into(),
            dropoff_location: "Islamabad".into(),
            payment_method: default_payment_method(),
        }
    }

    fn cart_with(items: &[(&str, f64, i64)]) -> CartStore<MemoryCartStorage> {
        let mut cart = CartStore::open(MemoryCartStorage::new()).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap();
        for (id, per_day, days) in items {
            let car = Car::new(*id, "Hyundai Creta", Amount::from_major(*per_day));
            let period = RentalPeriod::new(start, start + Duration::days(*days)).unwrap();
            cart.add_to_cart(CartItem::from_car(&car, &period, None)).unwrap();
        }
        cart
    }

    struct Harness {
        store: Arc<InMemoryDocumentStore>,
        gateway: Arc<FakeGateway>,
        notifier: Arc<RecordingNotifier>,
        orchestrator: CheckoutOrchestrator,
    }

    fn harness(gateway: FakeGateway, notifier: RecordingNotifier) -> Harness {
        let catalog = CarCatalog {
            cars: vec![
                Car::new("car-1", "Hyundai Creta", Amount::from_major(80.0)),
                Car::new("car-2", "Kia Sportage", Amount::from_major(50.0)),
            ],
        };
        let store = Arc::new(InMemoryDocumentStore::seeded(&catalog).unwrap());
        let gateway = Arc::new(gateway);
        let notifier = Arc::new(notifier);
        let orchestrator = CheckoutOrchestrator::new(
            store.clone(),
            gateway.clone(),
            notifier.clone(),
            CheckoutUrls::new("https://rentals.example.com"),
            Currency::USD,
        );
        Harness {
            store,
            gateway,
            notifier,
            orchestrator,
        }
    }

    #[test]
    fn test_form_reports_every_failing_field() {
        let form = CheckoutForm {
            phone: "12ab".into(),
            ..Default::default()
        };
        let Err(RentalError::Validation(errors)) = form.validate() else {
            panic!("expected validation failure");
        };
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Name is required",
                "Phone number must be at least 10 digits",
                "Phone number must contain only digits",
                "Address is required",
                "City is required",
                "Pickup location is required",
                "Dropoff location is required",
            ]
        );
    }

    #[test]
    fn test_form_accepts_digit_phone() {
        assert!(valid_form().validate().is_ok());
        let form: CheckoutForm = serde_json::from_value(json!({
            "name": "A", "phone": "0123456789", "address": "x", "city": "y",
            "pickupLocation": "p", "dropoffLocation": "d"
        }))
        .unwrap();
        assert_eq!(form.payment_method, "creditCard");
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn test_successful_checkout() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let mut cart = cart_with(&[("car-1", 80.0, 3), ("car-2", 50.0, 2)]);
        let identity = Identity::new("user_42").with_email("renter@example.com");

        let outcome = h
            .orchestrator
            .checkout(&identity, &valid_form(), &mut cart)
            .await
            .unwrap();

        assert_eq!(outcome.checkout_url(), "https://pay.example/cs_test_1");
        assert_eq!(outcome.rental.status, RentalStatus::Pending);
        assert_eq!(outcome.rental.payment_status, PaymentStatus::Unpaid);
        assert_eq!(outcome.rental.car_id(), "car-1");
        assert_eq!(outcome.rental.total_price, Amount::from_major(340.0));
        assert_eq!(outcome.rental.duration, 3);
        assert_eq!(outcome.items.len(), 2);
        assert!(cart.is_empty());

        let orders = h.gateway.orders.lock().unwrap();
        assert_eq!(orders[0].line_items.len(), 2);
        assert_eq!(orders[0].metadata[METADATA_RENTAL_ID], outcome.rental.id);
        assert_eq!(orders[0].metadata[METADATA_USER_ID], "user_42");

        assert_eq!(*h.notifier.sent.lock().unwrap(), vec!["renter@example.com"]);
    }

    #[tokio::test]
    async fn test_checkout_links_known_customer() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let customer = h
            .store
            .create("customer", json!({"name": "Bilal", "clerkId": "user_7"}))
            .await
            .unwrap();
        let mut cart = cart_with(&[("car-1", 80.0, 1)]);

        let outcome = h
            .orchestrator
            .checkout(&Identity::new("user_7"), &valid_form(), &mut cart)
            .await
            .unwrap();

        assert_eq!(
            outcome.rental.customer.map(|c| c.id),
            customer["_id"].as_str().map(String::from)
        );
    }

    #[tokio::test]
    async fn test_invalid_form_writes_nothing() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let mut cart = cart_with(&[("car-1", 80.0, 3)]);
        let form = CheckoutForm {
            phone: "123".into(),
            ..valid_form()
        };

        let err = h
            .orchestrator
            .checkout(&Identity::new("u"), &form, &mut cart)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(h.store.query(&Query::of_type("rental")).await.unwrap().is_empty());
        assert!(h.gateway.orders.lock().unwrap().is_empty());
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_cart_prices_are_replaced_by_catalog_prices() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let mut cart = cart_with(&[("car-1", 0.01, 3), ("car-2", 50.0, 2)]);

        let outcome = h
            .orchestrator
            .checkout(&Identity::new("u"), &valid_form(), &mut cart)
            .await
            .unwrap();

        assert_eq!(outcome.rental.total_price, Amount::from_major(340.0));
        assert_eq!(outcome.items[0].price_per_day, Amount::from_major(80.0));
        assert_eq!(outcome.items[0].total_price, Amount::from_major(240.0));

        let orders = h.gateway.orders.lock().unwrap();
        let charged: Amount = orders[0].line_items.iter().map(|l| l.total()).sum();
        assert_eq!(charged, Amount::from_major(340.0));
    }

    #[tokio::test]
    async fn test_unknown_car_writes_nothing() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let mut cart = cart_with(&[("car-404", 80.0, 1)]);

        let err = h
            .orchestrator
            .checkout(&Identity::new("u"), &valid_form(), &mut cart)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Car not found: car-404");
        assert!(h.store.query(&Query::of_type("rental")).await.unwrap().is_empty());
        assert!(h.gateway.orders.lock().unwrap().is_empty());
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        let mut cart = cart_with(&[]);

        let err = h
            .orchestrator
            .checkout(&Identity::new("u"), &valid_form(), &mut cart)
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_before_gateway() {
        let h = harness(FakeGateway::default(), RecordingNotifier::default());
        h.store.fail_writes(true);
        let mut cart = cart_with(&[("car-1", 80.0, 3)]);

        let err = h
            .orchestrator
            .checkout(&Identity::new("u"), &valid_form(), &mut cart)
            .await
            .unwrap_err();

        assert!(matches!(err, RentalError::Store(_)));
        assert!(h.gateway.orders.lock().unwrap().is_empty());
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_pending_rental_and_cart() {
        let gateway = FakeGateway {
            fail: true,
            ..Default::default()
        };
        let h = harness(gateway, RecordingNotifier::default());
        let mut cart = cart_with(&[("car-1", 80.0, 3)]);

        let err = h
            .orchestrator
            .checkout(&Identity::new("u").with_email("r@example.com"), &valid_form(), &mut cart)
            .await
            .unwrap_err();

        assert!(matches!(err, RentalError::Gateway { .. }));
        assert_eq!(cart.len(), 1);

        let rentals = h.store.query(&Query::of_type("rental")).await.unwrap();
        assert_eq!(rentals.len(), 1);
        assert_eq!(rentals[0]["paymentStatus"], "Unpaid");
        assert!(h.store.query(&Query::of_type("payment")).await.unwrap().is_empty());
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_checkout() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let h = harness(FakeGateway::default(), notifier);
        let mut cart = cart_with(&[("car-1", 80.0, 3)]);

        let outcome = h
            .orchestrator
            .checkout(&Identity::new("u").with_email("r@example.com"), &valid_form(), &mut cart)
            .await;

        assert!(outcome.is_ok());
        assert!(cart.is_empty());
    }
}
