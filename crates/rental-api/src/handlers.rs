//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//!
//! Every handler maps [`RentalError`] to an [`ErrorResponse`]. Client errors
//! keep their message; store and gateway failures are logged and replaced by
//! a generic message for the route.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rental_core::{
    confirmation_email, Amount, Availability, Car, CartItem, CartStore, CheckoutForm,
    CheckoutSession, ConditionReport, Customer, CustomerUpdate, FieldError, Identity,
    MemoryCartStorage, Payment, Price, Query as StoreQuery, Record, RentalError, Rental,
    RentalPeriod, RentalResult, WebhookOutcome, CONFIRMATION_SUBJECT,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

/// Header carrying the identity provider's user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional header carrying the user's email
pub const USER_EMAIL_HEADER: &str = "x-user-email";

// =============================================================================
// Errors
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message, status.as_u16())))
}

/// Convert a [`RentalError`]; 5xx causes are logged and replaced by `fallback`
fn rental_error_to_response(err: RentalError, fallback: &str) -> ApiError {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = match err {
        RentalError::NotFound { kind, .. } => ErrorResponse::new(format!("{} not found", kind), code),
        RentalError::Validation(fields) => {
            let message = RentalError::Validation(fields.clone()).to_string();
            ErrorResponse::new(message, code).with_errors(fields)
        }
        other if code >= 500 => {
            error!(error = %other, "{}", fallback);
            ErrorResponse::new(fallback, code)
        }
        other => ErrorResponse::new(other.to_string(), code),
    };
    (status, Json(response))
}

// =============================================================================
// Identity
// =============================================================================

/// Caller identity forwarded by the identity provider
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "User ID is required"))?;

        let mut identity = Identity::new(user_id);
        if let Some(email) = header_value(&parts.headers, USER_EMAIL_HEADER) {
            identity = identity.with_email(email);
        }
        Ok(CurrentUser(identity))
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Car with its image resolved to a URL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarView {
    #[serde(flatten)]
    pub car: Car,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn car_view(state: &AppState, car: Car) -> CarView {
    let image_url = car
        .image
        .as_ref()
        .and_then(|image| state.store.image_url(&image.asset));
    CarView { car, image_url }
}

/// Candidate rental dates
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl DateRangeRequest {
    fn period(&self) -> ApiResult<RentalPeriod> {
        RentalPeriod::new(self.start_date, self.end_date)
            .map_err(|e| rental_error_to_response(e, "Invalid dates"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableDatesResponse {
    pub car_id: String,
    pub unavailable_dates: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RentalsResponse {
    pub rentals: Vec<Rental>,
}

/// Direct booking of a single car
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub car_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Checkout request: billing form plus the renter's cart
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub form: CheckoutForm,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Checkout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub rental_id: String,
    pub session_id: String,
    /// Hosted checkout page (redirect the renter here)
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub rental_details: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionReportsQuery {
    pub rental_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Health
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rental-storefront",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend_name(),
        "gateway": state.gateway.provider_name(),
    }))
}

// =============================================================================
// Cars
// =============================================================================

pub async fn list_cars(State(state): State<AppState>) -> ApiResult<Json<Vec<CarView>>> {
    let cars = state
        .repo::<Car>()
        .list()
        .await
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))?;
    Ok(Json(cars.into_iter().map(|car| car_view(&state, car)).collect()))
}

pub async fn get_car(
    State(state): State<AppState>,
    Path(car_id): Path<String>,
) -> ApiResult<Json<CarView>> {
    let car = state
        .repo::<Car>()
        .get(&car_id)
        .await
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))?;
    Ok(Json(car_view(&state, car)))
}

#[instrument(skip(state, car), fields(name = %car.name))]
pub async fn create_car(
    State(state): State<AppState>,
    Json(car): Json<Car>,
) -> ApiResult<(StatusCode, Json<CarView>)> {
    car.validate()
        .map_err(|e| rental_error_to_response(e, "Error creating car"))?;
    let car = state
        .repo::<Car>()
        .create(&car)
        .await
        .map_err(|e| rental_error_to_response(e, "Error creating car"))?;
    info!(car_id = %car.id, "Car created");
    Ok((StatusCode::CREATED, Json(car_view(&state, car))))
}

async fn rentals_for_car(state: &AppState, car_id: &str) -> RentalResult<Vec<Rental>> {
    state
        .repo::<Rental>()
        .find(StoreQuery::of_type(Rental::DOC_TYPE).filter("car._ref", car_id))
        .await
}

/// Every blocked day for a car, for the date picker
pub async fn unavailable_dates(
    State(state): State<AppState>,
    Path(car_id): Path<String>,
) -> ApiResult<Json<UnavailableDatesResponse>> {
    let fallback = "Error fetching data";
    let car = state
        .repo::<Car>()
        .get(&car_id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    let rentals = rentals_for_car(&state, &car.id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;

    let dates = state.checker.unavailable_dates(&car.id, &rentals);
    Ok(Json(UnavailableDatesResponse {
        car_id: car.id,
        unavailable_dates: dates.into_iter().collect(),
    }))
}

/// Check a candidate date range for a car
#[instrument(skip(state, request))]
pub async fn check_availability(
    State(state): State<AppState>,
    Path(car_id): Path<String>,
    Json(request): Json<DateRangeRequest>,
) -> ApiResult<Json<Availability>> {
    let fallback = "Error fetching data";
    let period = request.period()?;
    let car = state
        .repo::<Car>()
        .get(&car_id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    let rentals = rentals_for_car(&state, &car.id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;

    Ok(Json(state.checker.check_rentals(&car.id, &rentals, &period)))
}

// =============================================================================
// Customers
// =============================================================================

pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    state
        .repo::<Customer>()
        .list()
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

#[instrument(skip(state, customer))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(customer): Json<Customer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state
        .repo::<Customer>()
        .create(&customer)
        .await
        .map_err(|e| rental_error_to_response(e, "Error creating customer"))?;
    info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<Customer>> {
    state
        .repo::<Customer>()
        .get(&customer_id)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

#[instrument(skip(state, update))]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(update): Json<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    if update.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "No fields to update"));
    }
    state
        .repo::<Customer>()
        .patch(&customer_id, &update)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error updating customer"))
}

#[instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .repo::<Customer>()
        .delete(&customer_id)
        .await
        .map_err(|e| rental_error_to_response(e, "Error deleting customer"))?;
    Ok(Json(MessageResponse {
        message: "Customer deleted successfully",
    }))
}

/// The customer record linked to the caller's identity
pub async fn current_customer(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<Customer>> {
    let matches = state
        .repo::<Customer>()
        .find(StoreQuery::of_type(Customer::DOC_TYPE).filter("clerkId", identity.user_id.as_str()))
        .await
        .map_err(|e| rental_error_to_response(e, "Error fetching user data"))?;

    matches
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Customer not found"))
}

// =============================================================================
// Rentals
// =============================================================================

pub async fn list_rentals(
    State(state): State<AppState>,
    Query(params): Query<RentalsQuery>,
) -> ApiResult<Json<RentalsResponse>> {
    let user_id = params
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "User ID is required"))?;

    let rentals = state
        .repo::<Rental>()
        .find(StoreQuery::of_type(Rental::DOC_TYPE).filter("userId", user_id.as_str()))
        .await
        .map_err(|e| rental_error_to_response(e, "Failed to fetch rentals"))?;
    Ok(Json(RentalsResponse { rentals }))
}

pub async fn get_rental(
    State(state): State<AppState>,
    Path(rental_id): Path<String>,
) -> ApiResult<Json<Rental>> {
    state
        .repo::<Rental>()
        .get(&rental_id)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

/// Book one car directly. The dates are checked against the car's existing
/// rentals first.
#[instrument(skip(state, request), fields(user_id = %identity.user_id, car_id = %request.car_id))]
pub async fn create_rental(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<CreateRentalRequest>,
) -> ApiResult<(StatusCode, Json<Rental>)> {
    let fallback = "Error creating rental";
    let period = DateRangeRequest {
        start_date: request.start_date,
        end_date: request.end_date,
    }
    .period()?;

    let car = state
        .repo::<Car>()
        .get(&request.car_id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    let existing = rentals_for_car(&state, &car.id)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    state
        .checker
        .ensure_available(&car.id, &existing, &period)
        .map_err(|e| rental_error_to_response(e, fallback))?;

    let total = period.price(car.price_per_day);
    let mut rental = Rental::pending(car.id.clone(), Some(identity.user_id), period, total);
    if let Some(customer_id) = request.customer_id {
        rental = rental.with_customer(customer_id);
    }

    let rental = state
        .repo::<Rental>()
        .create(&rental)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    info!(rental_id = %rental.id, "Rental created");
    Ok((StatusCode::CREATED, Json(rental)))
}

// =============================================================================
// Payments
// =============================================================================

#[instrument(skip(state, payment), fields(rental_id = %payment.rental.id))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(payment): Json<Payment>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    if !payment.amount.is_positive() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Payment amount must be positive",
        ));
    }
    let payment = state
        .repo::<Payment>()
        .create(&payment)
        .await
        .map_err(|e| rental_error_to_response(e, "Error processing payment"))?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> ApiResult<Json<Payment>> {
    state
        .repo::<Payment>()
        .get(&payment_id)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

// =============================================================================
// Checkout
// =============================================================================

/// Turn the posted cart into a pending rental and a hosted checkout session
#[instrument(skip(state, request), fields(user_id = %identity.user_id, items = request.items.len()))]
pub async fn create_checkout(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let fallback = "Failed to create checkout session";
    let mut cart = CartStore::open(MemoryCartStorage::new())
        .map_err(|e| rental_error_to_response(e, fallback))?;
    for item in request.items {
        cart.add_to_cart(item)
            .map_err(|e| rental_error_to_response(e, fallback))?;
    }

    let outcome = state
        .orchestrator
        .checkout(&identity, &request.form, &mut cart)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;

    Ok(Json(CheckoutResponse {
        rental_id: outcome.rental.id,
        session_id: outcome.session.session_id,
        url: outcome.session.checkout_url,
        expires_at: outcome.session.expires_at.map(|t| t.to_rfc3339()),
    }))
}

/// Look up a checkout session for the success page
pub async fn get_checkout_session(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> ApiResult<Json<CheckoutSession>> {
    let session_id = params
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Session ID is required"))?;

    state
        .gateway
        .retrieve_session(&session_id)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Failed to retrieve checkout session"))
}

// =============================================================================
// Email
// =============================================================================

#[instrument(skip(state, request))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let fallback = "Failed to send email";
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "A valid email is required",
        ));
    }

    let html = confirmation_email(&request.rental_details)
        .map_err(|e| rental_error_to_response(e, fallback))?;
    state
        .notifier
        .send_email(email, CONFIRMATION_SUBJECT, &html)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;

    Ok(Json(MessageResponse {
        message: "Email sent successfully",
    }))
}

// =============================================================================
// Condition Reports
// =============================================================================

pub async fn list_condition_reports(
    State(state): State<AppState>,
    Query(params): Query<ConditionReportsQuery>,
) -> ApiResult<Json<Vec<ConditionReport>>> {
    let mut query = StoreQuery::of_type(ConditionReport::DOC_TYPE);
    if let Some(rental_id) = params.rental_id.filter(|id| !id.is_empty()) {
        query = query.filter("rental._ref", rental_id);
    }
    state
        .repo::<ConditionReport>()
        .find(query)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

#[instrument(skip(state, report))]
pub async fn create_condition_report(
    State(state): State<AppState>,
    Json(report): Json<ConditionReport>,
) -> ApiResult<(StatusCode, Json<ConditionReport>)> {
    let fallback = "Error creating condition report";
    if let Some(rental) = &report.rental {
        state
            .repo::<Rental>()
            .get(&rental.id)
            .await
            .map_err(|e| rental_error_to_response(e, fallback))?;
    }

    let report = state
        .repo::<ConditionReport>()
        .create(&report)
        .await
        .map_err(|e| rental_error_to_response(e, fallback))?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn get_condition_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> ApiResult<Json<ConditionReport>> {
    state
        .repo::<ConditionReport>()
        .get(&report_id)
        .await
        .map(Json)
        .map_err(|e| rental_error_to_response(e, "Error fetching data"))
}

// =============================================================================
// Webhooks
// =============================================================================

/// Handle a payment gateway webhook. The raw body is needed for signature
/// verification.
#[instrument(skip(state, headers, body))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = header_value(&headers, "stripe-signature").ok_or_else(|| {
        error_response(StatusCode::BAD_REQUEST, "Missing Stripe-Signature header")
    })?;

    match state.reconciler.handle(&body, signature).await {
        Ok(WebhookOutcome::RentalPaid { rental_id }) => info!(%rental_id, "Rental paid"),
        Ok(WebhookOutcome::AlreadyPaid { rental_id }) => info!(%rental_id, "Duplicate delivery"),
        Ok(WebhookOutcome::Ignored) => {}
        Err(e) => {
            warn!(error = %e, "Webhook rejected");
            return Err(rental_error_to_response(e, "Failed to update rental"));
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

// =============================================================================
// Landing Pages
// =============================================================================

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_STYLE: &str = "font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f3f4f6;";

/// Checkout success page
pub async fn checkout_success(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> impl IntoResponse {
    let mut amount_line = String::new();
    if let Some(session_id) = params.session_id.as_deref().filter(|id| !id.is_empty()) {
        match state.gateway.retrieve_session(session_id).await {
            Ok(session) => {
                if let Some(total) = session.amount_total {
                    let amount = Amount::from_minor_units(total, state.config.currency);
                    amount_line = format!(
                        r#"<p style="color: #374151;">Amount Paid: {}</p>"#,
                        escape_html(&Price::new(amount, state.config.currency).display())
                    );
                }
            }
            Err(e) => warn!(error = %e, "Could not load checkout session for success page"),
        }
    }

    Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Successful</title></head>
<body style="{}">
    <div style="background: white; padding: 48px; border-radius: 12px; text-align: center;">
        <h1 style="color: #16a34a;">Payment Successful!</h1>
        {}
        <p><a href="{}">Return to Home</a></p>
    </div>
</body>
</html>
"#,
        PAGE_STYLE,
        amount_line,
        escape_html(&state.urls.base_url)
    ))
}

/// Checkout cancel page
pub async fn checkout_cancel(State(state): State<AppState>) -> impl IntoResponse {
    Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Cancelled</title></head>
<body style="{}">
    <div style="background: white; padding: 48px; border-radius: 12px; text-align: center;">
        <h1 style="color: #dc2626;">Payment Cancelled</h1>
        <p style="color: #6b7280;">Your rental is not confirmed and no charges were made.</p>
        <p><a href="{}">Return to Home</a></p>
    </div>
</body>
</html>
"#,
        PAGE_STYLE,
        escape_html(&state.urls.base_url)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.message, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_not_found_hides_id() {
        let (status, Json(body)) =
            rental_error_to_response(RentalError::not_found("Car", "car-9"), "Error fetching data");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Car not found");
    }

    #[test]
    fn test_upstream_errors_use_fallback() {
        let (status, Json(body)) = rental_error_to_response(
            RentalError::Store("connection reset by peer".into()),
            "Error fetching data",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Error fetching data");
    }

    #[test]
    fn test_validation_lists_fields() {
        let err = RentalError::Validation(vec![FieldError::new("city", "City is required")]);
        let (status, Json(body)) = rental_error_to_response(err, "unused");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].field, "city");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
