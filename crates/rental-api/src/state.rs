//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the document store, payment gateway, notifier and the checkout
//! services built on top of them.

use crate::mailer::ResendNotifier;
use rental_core::{
    BlockingPolicy, BookingChecker, CarCatalog, CheckMode, CheckoutOrchestrator, CheckoutUrls,
    Currency, InMemoryDocumentStore, LoggingNotifier, PaymentReconciler, Record, Repository,
    SharedDocumentStore, SharedNotifier, SharedPaymentGateway,
};
use rental_sanity::SanityClient;
use rental_stripe::StripeCheckoutGateway;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Invalid server configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("invalid socket address: {0}")]
    InvalidAddress(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sanity,
    /// Process-local store seeded from `config/cars.toml`
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Storefront base URL for checkout redirects
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    pub log_format: LogFormat,
    pub store_backend: StoreBackend,
    pub blocking_policy: BlockingPolicy,
    pub check_mode: CheckMode,
    pub currency: Currency,
}

impl AppConfig {
    /// Load from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: p,
            })?,
            None => 8080,
        };

        let log_format = match var("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let store_backend = match var("STORE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
            Some("sanity") => StoreBackend::Sanity,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
            None if var("SANITY_PROJECT_ID").is_some() => StoreBackend::Sanity,
            None => StoreBackend::Memory,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            base_url: var("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_format,
            store_backend,
            blocking_policy: parse_or_default(var("BOOKING_BLOCKING_POLICY"), "BOOKING_BLOCKING_POLICY")?,
            check_mode: parse_or_default(var("BOOKING_CHECK_MODE"), "BOOKING_CHECK_MODE")?,
            currency: parse_or_default(var("CURRENCY"), "CURRENCY")?,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn booking_checker(&self) -> BookingChecker {
        BookingChecker::new(self.blocking_policy, self.check_mode)
    }
}

fn parse_or_default<T>(value: Option<String>, var: &'static str) -> Result<T, ConfigError>
where
    T: FromStr + Default,
{
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
        None => Ok(T::default()),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    pub store: SharedDocumentStore,
    pub gateway: SharedPaymentGateway,
    pub notifier: SharedNotifier,
    pub checker: BookingChecker,
    /// Checkout redirect URLs
    pub urls: CheckoutUrls,
    pub orchestrator: CheckoutOrchestrator,
    pub reconciler: PaymentReconciler,
}

impl AppState {
    /// Build state from the environment: document store per `STORE_BACKEND`,
    /// Stripe gateway, and Resend if `RESEND_API_KEY` is set.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store: SharedDocumentStore = match config.store_backend {
            StoreBackend::Sanity => Arc::new(
                SanityClient::from_env()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize Sanity: {}", e))?,
            ),
            StoreBackend::Memory => Arc::new(
                InMemoryDocumentStore::seeded(&load_car_catalog()?)
                    .map_err(|e| anyhow::anyhow!("Failed to seed store: {}", e))?,
            ),
        };

        let gateway: SharedPaymentGateway = Arc::new(
            StripeCheckoutGateway::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?,
        );

        let notifier: SharedNotifier = match ResendNotifier::from_env() {
            Some(resend) => Arc::new(resend),
            None => {
                warn!("RESEND_API_KEY not set, confirmation emails will only be logged");
                Arc::new(LoggingNotifier)
            }
        };

        Ok(Self::from_parts(config, store, gateway, notifier))
    }

    /// Assemble state from already-built adapters
    pub fn from_parts(
        config: AppConfig,
        store: SharedDocumentStore,
        gateway: SharedPaymentGateway,
        notifier: SharedNotifier,
    ) -> Self {
        let urls = CheckoutUrls::new(&config.base_url);
        let orchestrator = CheckoutOrchestrator::new(
            store.clone(),
            gateway.clone(),
            notifier.clone(),
            urls.clone(),
            config.currency,
        );
        let reconciler = PaymentReconciler::new(gateway.clone(), store.clone(), config.currency);

        Self {
            checker: config.booking_checker(),
            config,
            store,
            gateway,
            notifier,
            urls,
            orchestrator,
            reconciler,
        }
    }

    /// Typed repository over the shared store
    pub fn repo<R: Record>(&self) -> Repository<R> {
        Repository::new(self.store.clone())
    }
}

/// Load the seed car catalog from config file
fn load_car_catalog() -> anyhow::Result<CarCatalog> {
    let config_paths = [
        "config/cars.toml",
        "../config/cars.toml",
        "../../config/cars.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = CarCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!("Loaded {} cars from {}", catalog.cars.len(), path);
            return Ok(catalog);
        }
    }

    warn!("No car catalog found, starting with an empty store");
    Ok(CarCatalog::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_app_config_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.blocking_policy, BlockingPolicy::AllRentals);
        assert_eq!(config.check_mode, CheckMode::Endpoints);
        assert_eq!(config.currency, Currency::USD);
    }

    #[test]
    fn test_sanity_project_selects_sanity_backend() {
        let config = config_from(&[("SANITY_PROJECT_ID", "abc123")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Sanity);

        let config = config_from(&[("SANITY_PROJECT_ID", "abc123"), ("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_booking_settings() {
        let config = config_from(&[
            ("BOOKING_BLOCKING_POLICY", "exclude-cancelled"),
            ("BOOKING_CHECK_MODE", "full-range"),
            ("CURRENCY", "eur"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.blocking_policy, BlockingPolicy::ExcludeCancelled);
        assert_eq!(config.check_mode, CheckMode::FullRange);
        assert_eq!(config.currency, Currency::EUR);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: eighty");

        assert!(config_from(&[("BOOKING_CHECK_MODE", "sometimes")]).is_err());
        assert!(config_from(&[("STORE_BACKEND", "postgres")]).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = config_from(&[("HOST", "0.0.0.0"), ("PORT", "3000")]).unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        config.host = "not a host".to_string();
        assert!(config.socket_addr().is_err());
    }
}
