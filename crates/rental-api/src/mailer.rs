//! # Resend Mailer
//!
//! [`Notifier`] backed by the Resend email API.

use async_trait::async_trait;
use rental_core::{Notifier, RentalError, RentalResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};

pub const DEFAULT_API_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_FROM: &str = "onboarding@resend.dev";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendErrorResponse {
    message: String,
}

pub struct ResendNotifier {
    api_key: String,
    from: String,
    api_base_url: String,
    client: Client,
}

impl ResendNotifier {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }

    /// `RESEND_API_KEY` and optional `EMAIL_FROM`. `None` if no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let from = std::env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string());
        Some(Self::new(api_key, from))
    }

    /// Builder: point at a different host (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    #[instrument(skip(self, html))]
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> RentalResult<()> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_base_url))
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [to],
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ResendErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            error!(%status, %message, "Resend rejected email");
            return Err(RentalError::Notification(message));
        }

        let sent: SendEmailResponse = serde_json::from_str(&body)
            .map_err(|e| RentalError::Notification(format!("unexpected Resend response: {}", e)))?;
        info!(email_id = %sent.id, "Email sent");
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "resend"
    }
}
