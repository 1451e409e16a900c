//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - API v1:
///   - GET|POST /api/v1/cars, GET /api/v1/cars/{id}
///   - GET|POST /api/v1/cars/{id}/availability
///   - GET|POST /api/v1/customers, GET /api/v1/customers/me
///   - GET|PUT|DELETE /api/v1/customers/{id}
///   - GET|POST /api/v1/rentals, GET /api/v1/rentals/{id}
///   - POST /api/v1/payments, GET /api/v1/payments/{id}
///   - POST /api/v1/checkout, GET /api/v1/checkout/session
///   - POST /api/v1/send-email
///   - GET|POST /api/v1/condition-reports, GET /api/v1/condition-reports/{id}
///
/// - Webhooks:
///   - POST /webhooks - payment gateway callback
///
/// - Static pages:
///   - GET /checkout/success - Success page
///   - GET /checkout/cancel - Cancel page
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Gateway redirect targets
    let checkout_pages = Router::new()
        .route("/success", get(handlers::checkout_success))
        .route("/cancel", get(handlers::checkout_cancel));

    let api_routes = Router::new()
        // Catalog
        .route("/cars", get(handlers::list_cars).post(handlers::create_car))
        .route("/cars/{car_id}", get(handlers::get_car))
        .route(
            "/cars/{car_id}/availability",
            get(handlers::unavailable_dates).post(handlers::check_availability),
        )
        // Customers
        .route(
            "/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/customers/me", get(handlers::current_customer))
        .route(
            "/customers/{customer_id}",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        // Rentals
        .route(
            "/rentals",
            get(handlers::list_rentals).post(handlers::create_rental),
        )
        .route("/rentals/{rental_id}", get(handlers::get_rental))
        // Payments
        .route("/payments", post(handlers::create_payment))
        .route("/payments/{payment_id}", get(handlers::get_payment))
        // Checkout
        .route("/checkout", post(handlers::create_checkout))
        .route("/checkout/session", get(handlers::get_checkout_session))
        .route("/send-email", post(handlers::send_email))
        // Condition reports
        .route(
            "/condition-reports",
            get(handlers::list_condition_reports).post(handlers::create_condition_report),
        )
        .route(
            "/condition-reports/{report_id}",
            get(handlers::get_condition_report),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/checkout", checkout_pages)
        .nest("/api/v1", api_routes)
        // Raw body, signed by the gateway
        .route("/webhooks", post(handlers::payment_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
