//! # Sanity Configuration

use rental_core::RentalError;
use std::env;

pub const DEFAULT_API_VERSION: &str = "2024-01-01";
pub const DEFAULT_DATASET: &str = "production";

#[derive(Debug, Clone)]
pub struct SanityConfig {
    pub project_id: String,

    pub dataset: String,

    /// Write token. Reads of a public dataset work without it.
    pub api_token: Option<String>,

    /// Dated API version, e.g. `2024-01-01`
    pub api_version: String,

    /// `https://{project_id}.api.sanity.io` unless overridden in tests
    pub api_host: String,

    pub timeout_secs: u64,
}

impl SanityConfig {
    /// Load from `SANITY_PROJECT_ID`, `SANITY_DATASET`, `SANITY_API_TOKEN`
    /// and `SANITY_API_VERSION`.
    pub fn from_env() -> Result<Self, RentalError> {
        let project_id = env::var("SANITY_PROJECT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RentalError::Configuration("SANITY_PROJECT_ID not set".to_string()))?;

        let mut config = Self::new(project_id, env::var("SANITY_DATASET").unwrap_or_else(|_| DEFAULT_DATASET.to_string()));
        config.api_token = env::var("SANITY_API_TOKEN").ok().filter(|t| !t.is_empty());
        if let Ok(version) = env::var("SANITY_API_VERSION") {
            config.api_version = version.trim_start_matches('v').to_string();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            api_host: format!("https://{}.api.sanity.io", project_id),
            project_id,
            dataset: dataset.into(),
            api_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn validate(&self) -> Result<(), RentalError> {
        let valid_id = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !valid_id(&self.project_id) {
            return Err(RentalError::Configuration(
                "SANITY_PROJECT_ID must be alphanumeric".to_string(),
            ));
        }
        if !valid_id(&self.dataset) {
            return Err(RentalError::Configuration(
                "SANITY_DATASET must be alphanumeric".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Builder: point at a different host (for testing)
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into();
        self
    }

    pub fn query_url(&self) -> String {
        format!("{}/v{}/data/query/{}", self.api_host, self.api_version, self.dataset)
    }

    pub fn mutate_url(&self) -> String {
        format!("{}/v{}/data/mutate/{}", self.api_host, self.api_version, self.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = SanityConfig::new("abc123", "production");
        assert_eq!(
            config.query_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
        );
        assert_eq!(
            config.mutate_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/mutate/production"
        );
    }

    #[test]
    fn test_validate_rejects_odd_ids() {
        assert!(SanityConfig::new("abc123", "production").validate().is_ok());
        assert!(SanityConfig::new("abc/../x", "production").validate().is_err());
        assert!(SanityConfig::new("abc", "").validate().is_err());
    }
}
