//! End-to-end tests for the storefront API: in-memory store, Stripe gateway
//! against a mock Stripe server, recording notifier.

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use rental_api::{create_router, AppConfig, AppState};
use rental_core::{
    Amount, Car, CarCatalog, DocumentStore, InMemoryDocumentStore, Notifier, PaymentStatus,
    Query, RentalResult,
};
use rental_stripe::{sign_payload, StripeCheckoutGateway, StripeConfig};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_SECRET: &str = "whsec_test_secret";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> RentalResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

struct Harness {
    server: TestServer,
    store: Arc<InMemoryDocumentStore>,
    notifier: Arc<RecordingNotifier>,
    stripe: MockServer,
}

fn catalog() -> CarCatalog {
    CarCatalog {
        cars: vec![
            Car::new("car-1", "Koenigsegg", Amount::from_cents(9_900))
                .with_brand("Koenigsegg")
                .with_type("Sport")
                .with_image("image-abc123-800x600-png"),
            Car::new("car-2", "Nissan GT-R", Amount::from_cents(8_000)).with_type("Sport"),
        ],
    }
}

async fn harness() -> Harness {
    let stripe = MockServer::start().await;
    let config = StripeConfig::new("sk_test_123", "pk_test_123", WEBHOOK_SECRET)
        .with_api_base_url(stripe.uri());
    let gateway = Arc::new(StripeCheckoutGateway::new(config).unwrap());

    let store = Arc::new(InMemoryDocumentStore::seeded(&catalog()).unwrap());
    let notifier = Arc::new(RecordingNotifier::default());

    let app_config = AppConfig::from_lookup(|key| match key {
        "BASE_URL" => Some("http://shop.test".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::from_parts(app_config, store.clone(), gateway, notifier.clone());

    Harness {
        server: TestServer::new(create_router(state)).unwrap(),
        store,
        notifier,
        stripe,
    }
}

fn user(id: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_static(id),
    )
}

fn cart_item(car_id: &str, name: &str, price_per_day: f64, start_day: u32, end_day: u32) -> Value {
    let start = Utc.with_ymd_and_hms(2025, 3, start_day, 10, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, end_day, 10, 0, 0).unwrap();
    let days = (end_day - start_day) as f64;
    json!({
        "id": car_id,
        "name": name,
        "type": "Sport",
        "pricePerDay": price_per_day,
        "rentalStartDate": start.to_rfc3339(),
        "rentalEndDate": end.to_rfc3339(),
        "totalPrice": price_per_day * days,
        "image": ""
    })
}

fn checkout_body(items: Vec<Value>) -> Value {
    json!({
        "name": "Sana Khan",
        "phone": "03001234567",
        "address": "12 Mall Road",
        "city": "Lahore",
        "pickupLocation": "Airport",
        "dropoffLocation": "Downtown",
        "paymentMethod": "creditCard",
        "items": items
    })
}

async fn mount_session_created(stripe: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1",
            "status": "open",
            "payment_status": "unpaid",
            "amount_total": 37700
        })))
        .mount(stripe)
        .await;
}

async fn rental_docs(store: &InMemoryDocumentStore) -> Vec<Value> {
    store.query(&Query::of_type("rental")).await.unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness().await;
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["gateway"], "stripe");
}

#[tokio::test]
async fn test_list_and_get_cars() {
    let h = harness().await;

    let cars: Value = h.server.get("/api/v1/cars").await.json();
    assert_eq!(cars.as_array().unwrap().len(), 2);

    let response = h.server.get("/api/v1/cars/car-1").await;
    response.assert_status_ok();
    let car: Value = response.json();
    assert_eq!(car["name"], "Koenigsegg");
    assert_eq!(car["pricePerDay"], 99.0);

    let response = h.server.get("/api/v1/cars/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Car not found");
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_create_car_validates() {
    let h = harness().await;

    let response = h
        .server
        .post("/api/v1/cars")
        .json(&json!({"name": "Free Car", "pricePerDay": 0}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post("/api/v1/cars")
        .json(&json!({"name": "Civic", "pricePerDay": 45.5, "transmission": "Auto"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let car: Value = response.json();
    assert!(car["_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_rental_blocks_dates() {
    let h = harness().await;
    let (name, value) = user("user_1");

    let response = h
        .server
        .post("/api/v1/rentals")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "carId": "car-1",
            "startDate": "2025-03-10T10:00:00Z",
            "endDate": "2025-03-12T10:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let rental: Value = response.json();
    assert_eq!(rental["status"], "Pending");
    assert_eq!(rental["paymentStatus"], "Unpaid");
    assert_eq!(rental["duration"], 2);
    assert_eq!(rental["totalPrice"], 198.0);

    let blocked: Value = h.server.get("/api/v1/cars/car-1/availability").await.json();
    assert_eq!(
        blocked["unavailableDates"],
        json!(["2025-03-10", "2025-03-11", "2025-03-12"])
    );

    let check: Value = h
        .server
        .post("/api/v1/cars/car-1/availability")
        .json(&json!({"startDate": "2025-03-12T09:00:00Z", "endDate": "2025-03-14T09:00:00Z"}))
        .await
        .json();
    assert_eq!(check["available"], false);
    assert_eq!(check["conflicts"], json!(["2025-03-12"]));

    // Other cars are unaffected
    let check: Value = h
        .server
        .post("/api/v1/cars/car-2/availability")
        .json(&json!({"startDate": "2025-03-10T10:00:00Z", "endDate": "2025-03-12T10:00:00Z"}))
        .await
        .json();
    assert_eq!(check["available"], true);

    let response = h
        .server
        .post("/api/v1/rentals")
        .add_header(name, value)
        .json(&json!({
            "carId": "car-1",
            "startDate": "2025-03-11T10:00:00Z",
            "endDate": "2025-03-15T10:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid request: Selected dates are not available");
}

#[tokio::test]
async fn test_rentals_require_user_id() {
    let h = harness().await;

    let response = h.server.get("/api/v1/rentals").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "User ID is required");

    let body: Value = h.server.get("/api/v1/rentals?userId=user_1").await.json();
    assert_eq!(body["rentals"], json!([]));

    let response = h
        .server
        .post("/api/v1/rentals")
        .json(&json!({"carId": "car-1", "startDate": "2025-03-10T10:00:00Z", "endDate": "2025-03-12T10:00:00Z"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_crud_and_me() {
    let h = harness().await;

    let response = h
        .server
        .post("/api/v1/customers")
        .json(&json!({"name": "Sana", "email": "sana@example.com", "clerkId": "user_1"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let id = created["_id"].as_str().unwrap().to_string();

    let (name, value) = user("user_1");
    let me: Value = h
        .server
        .get("/api/v1/customers/me")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(me["_id"], id.as_str());

    let (name, value) = user("someone_else");
    h.server
        .get("/api/v1/customers/me")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let updated: Value = h
        .server
        .put(&format!("/api/v1/customers/{}", id))
        .json(&json!({"phone": "03001234567"}))
        .await
        .json();
    assert_eq!(updated["phone"], "03001234567");
    assert_eq!(updated["name"], "Sana");

    h.server
        .put(&format!("/api/v1/customers/{}", id))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let deleted: Value = h
        .server
        .delete(&format!("/api/v1/customers/{}", id))
        .await
        .json();
    assert_eq!(deleted["message"], "Customer deleted successfully");

    let response = h.server.get(&format!("/api/v1/customers/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Customer not found");
}

#[tokio::test]
async fn test_customer_routes_leave_other_documents_alone() {
    let h = harness().await;
    let (name, value) = user("user_1");
    let rental: Value = h
        .server
        .post("/api/v1/rentals")
        .add_header(name, value)
        .json(&json!({
            "carId": "car-1",
            "startDate": "2025-03-10T10:00:00Z",
            "endDate": "2025-03-12T10:00:00Z"
        }))
        .await
        .json();
    let rental_id = rental["_id"].as_str().unwrap().to_string();
    let before = rental_docs(&h.store).await;

    let response = h
        .server
        .put(&format!("/api/v1/customers/{}", rental_id))
        .json(&json!({"name": "Someone"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Customer not found");

    h.server
        .delete(&format!("/api/v1/customers/{}", rental_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert_eq!(rental_docs(&h.store).await, before);
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let h = harness().await;
    h.store.fail_writes(true);

    let response = h
        .server
        .post("/api/v1/customers")
        .json(&json!({"name": "Sana"}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Error creating customer");
}

#[tokio::test]
async fn test_checkout_creates_pending_rental() {
    let h = harness().await;
    mount_session_created(&h.stripe).await;

    let (name, value) = user("user_1");
    let response = h
        .server
        .post("/api/v1/checkout")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-user-email"),
            HeaderValue::from_static("sana@example.com"),
        )
        .json(&checkout_body(vec![
            cart_item("car-1", "Koenigsegg", 99.0, 10, 13),
            cart_item("car-2", "Nissan GT-R", 80.0, 20, 21),
        ]))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sessionId"], "cs_test_1");
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_test_1");

    let rentals = rental_docs(&h.store).await;
    assert_eq!(rentals.len(), 1);
    assert_eq!(rentals[0]["_id"], body["rentalId"]);
    assert_eq!(rentals[0]["car"]["_ref"], "car-1");
    assert_eq!(rentals[0]["userId"], "user_1");
    assert_eq!(rentals[0]["totalPrice"], 377.0);
    assert_eq!(rentals[0]["paymentStatus"], "Unpaid");

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "sana@example.com");
    assert_eq!(sent[0].1, "Your Rental Confirmation");
}

#[tokio::test]
async fn test_checkout_rejects_invalid_form() {
    let h = harness().await;

    let mut body = checkout_body(vec![cart_item("car-1", "Koenigsegg", 99.0, 10, 13)]);
    body["phone"] = json!("12ab");
    body["city"] = json!("");

    let (name, value) = user("user_1");
    let response = h
        .server
        .post("/api/v1/checkout")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"phone"));
    assert!(fields.contains(&"city"));

    assert!(rental_docs(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_checkout_gateway_failure_keeps_rental_unpaid() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"type": "api_error", "message": "Something went wrong"}
        })))
        .mount(&h.stripe)
        .await;

    let (name, value) = user("user_1");
    let response = h
        .server
        .post("/api/v1/checkout")
        .add_header(name, value)
        .json(&checkout_body(vec![cart_item("car-1", "Koenigsegg", 99.0, 10, 13)]))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Failed to create checkout session");

    let rentals = rental_docs(&h.store).await;
    assert_eq!(rentals.len(), 1);
    assert_eq!(rentals[0]["paymentStatus"], "Unpaid");
    assert!(h.store.query(&Query::of_type("payment")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_session_lookup() {
    let h = harness().await;
    h.server
        .get("/api/v1/checkout/session")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .get("/api/v1/checkout/session?session_id=..%2F..%2Fcustomers")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "status": "complete",
            "payment_status": "paid",
            "amount_total": 29700
        })))
        .mount(&h.stripe)
        .await;

    let session: Value = h
        .server
        .get("/api/v1/checkout/session?session_id=cs_test_1")
        .await
        .json();
    assert_eq!(session["session_id"], "cs_test_1");
    assert_eq!(session["amount_total"], 29700);

    let page = h.server.get("/checkout/success?session_id=cs_test_1").await;
    page.assert_status_ok();
    assert!(page.text().contains("Amount Paid: $297.00"));
}

#[tokio::test]
async fn test_webhook_marks_rental_paid_once() {
    let h = harness().await;
    mount_session_created(&h.stripe).await;

    let (name, value) = user("user_1");
    let checkout: Value = h
        .server
        .post("/api/v1/checkout")
        .add_header(name, value)
        .json(&checkout_body(vec![cart_item("car-1", "Koenigsegg", 99.0, 10, 13)]))
        .await
        .json();
    let rental_id = checkout["rentalId"].as_str().unwrap().to_string();

    let payload = serde_json::to_vec(&json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {"object": {
            "id": "cs_test_1",
            "object": "checkout.session",
            "amount_total": 29700,
            "currency": "usd",
            "payment_intent": "pi_123",
            "payment_status": "paid",
            "metadata": {"rentalId": rental_id, "userId": "user_1"}
        }}
    }))
    .unwrap();

    // Bad signature: nothing changes
    let response = h
        .server
        .post("/webhooks")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_static("t=1,v1=deadbeef"),
        )
        .bytes(payload.clone().into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(rental_docs(&h.store).await[0]["paymentStatus"], "Unpaid");

    let signature = sign_payload(WEBHOOK_SECRET, &payload, Utc::now().timestamp()).unwrap();
    for _ in 0..2 {
        let response = h
            .server
            .post("/webhooks")
            .add_header(
                HeaderName::from_static("stripe-signature"),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(payload.clone().into())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["received"], true);
    }

    let rental = &rental_docs(&h.store).await[0];
    let status: PaymentStatus = serde_json::from_value(rental["paymentStatus"].clone()).unwrap();
    assert_eq!(status, PaymentStatus::Paid);

    let payments = h.store.query(&Query::of_type("payment")).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["paymentIntentId"], "pi_123");
}

#[tokio::test]
async fn test_webhook_changes_only_target_payment_status() {
    let h = harness().await;
    let mut ids = Vec::new();
    for (user_id, car_id) in [("user_1", "car-1"), ("user_2", "car-2")] {
        let (name, value) = user(user_id);
        let rental: Value = h
            .server
            .post("/api/v1/rentals")
            .add_header(name, value)
            .json(&json!({
                "carId": car_id,
                "startDate": "2025-04-01T10:00:00Z",
                "endDate": "2025-04-03T10:00:00Z"
            }))
            .await
            .json();
        ids.push(rental["_id"].as_str().unwrap().to_string());
    }
    let find = |docs: &[Value], id: &str| -> Value {
        docs.iter().find(|d| d["_id"] == id).cloned().unwrap()
    };
    let before = rental_docs(&h.store).await;

    let payload = serde_json::to_vec(&json!({
        "id": "evt_2",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {"object": {
            "id": "cs_test_2",
            "object": "checkout.session",
            "amount_total": 19800,
            "currency": "usd",
            "payment_intent": "pi_456",
            "metadata": {"rentalId": ids[0], "userId": "user_1"}
        }}
    }))
    .unwrap();
    let signature = sign_payload(WEBHOOK_SECRET, &payload, Utc::now().timestamp()).unwrap();
    h.server
        .post("/webhooks")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&signature).unwrap(),
        )
        .bytes(payload.into())
        .await
        .assert_status_ok();

    let after = rental_docs(&h.store).await;
    assert_eq!(after.len(), 2);
    assert_eq!(find(&after, &ids[1]), find(&before, &ids[1]));

    let mut target = find(&after, &ids[0]);
    assert_eq!(target["paymentStatus"], "Paid");
    target["paymentStatus"] = json!("Unpaid");
    assert_eq!(target, find(&before, &ids[0]));
}

#[tokio::test]
async fn test_webhook_requires_signature_header() {
    let h = harness().await;
    let response = h.server.post("/webhooks").bytes("{}".into()).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Missing Stripe-Signature header");
}

#[tokio::test]
async fn test_send_email() {
    let h = harness().await;

    h.server
        .post("/api/v1/send-email")
        .json(&json!({"email": "", "rentalDetails": {}}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let body: Value = h
        .server
        .post("/api/v1/send-email")
        .json(&json!({"email": "sana@example.com", "rentalDetails": {"car": "<Koenigsegg>"}}))
        .await
        .json();
    assert_eq!(body["message"], "Email sent successfully");

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].2.contains("&lt;Koenigsegg&gt;"));
}

#[tokio::test]
async fn test_condition_reports() {
    let h = harness().await;

    h.server
        .post("/api/v1/condition-reports")
        .json(&json!({"rental": {"_ref": "missing", "_type": "reference"}, "beforeRental": "Clean"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let rental = h
        .store
        .create("rental", json!({
            "car": {"_ref": "car-1", "_type": "reference"},
            "startDate": "2025-03-10T10:00:00Z",
            "endDate": "2025-03-12T10:00:00Z",
            "duration": 2,
            "totalPrice": 198.0
        }))
        .await
        .unwrap();
    let rental_id = rental["_id"].as_str().unwrap();

    let response = h
        .server
        .post("/api/v1/condition-reports")
        .json(&json!({
            "rental": {"_ref": rental_id, "_type": "reference"},
            "beforeRental": "No scratches"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let report: Value = response.json();
    let report_id = report["_id"].as_str().unwrap();

    let fetched: Value = h
        .server
        .get(&format!("/api/v1/condition-reports/{}", report_id))
        .await
        .json();
    assert_eq!(fetched["beforeRental"], "No scratches");

    let listed: Value = h
        .server
        .get(&format!("/api/v1/condition-reports?rentalId={}", rental_id))
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = h.server.get("/api/v1/condition-reports/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Condition report not found");
}

#[tokio::test]
async fn test_payments() {
    let h = harness().await;

    h.server
        .post("/api/v1/payments")
        .json(&json!({"rental": {"_ref": "r1"}, "amount": 0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post("/api/v1/payments")
        .json(&json!({"rental": {"_ref": "r1"}, "amount": 120.5, "status": "Completed"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let payment: Value = response.json();

    let fetched: Value = h
        .server
        .get(&format!("/api/v1/payments/{}", payment["_id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(fetched["amount"], 120.5);
    assert_eq!(fetched["currency"], "USD");

    h.server
        .get("/api/v1/payments/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_page() {
    let h = harness().await;
    let page = h.server.get("/checkout/cancel").await;
    page.assert_status_ok();
    assert!(page.text().contains("Payment Cancelled"));
    assert!(page.text().contains("http://shop.test"));
}
