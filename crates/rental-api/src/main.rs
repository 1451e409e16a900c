//! # Rental Storefront
//!
//! Car-rental storefront API server.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export SANITY_PROJECT_ID=abc123      # omit to use the in-memory store
//! export RESEND_API_KEY=re_...         # omit to log emails instead
//!
//! # Run the server
//! rental-storefront
//! ```

use rental_api::{routes, state::AppState, AppConfig, LogFormat};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let config = AppConfig::from_env()?;
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Document store: {}", state.store.backend_name());
    info!("Payment gateway: {}", state.gateway.provider_name());
    info!("Email: {}", state.notifier.notifier_name());
    info!(
        "Booking checks: {:?} / {:?}",
        state.checker.policy, state.checker.mode
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Rental storefront starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
        info!("Webhook: POST http://{}/webhooks", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Rental Storefront
  ━━━━━━━━━━━━━━━━━━━━━━━
  Cars, carts and checkout
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
