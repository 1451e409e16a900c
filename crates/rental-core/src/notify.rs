//! # Notifications
//!
//! Outbound email. Delivery is best-effort everywhere it is used: callers log
//! a failed send and carry on.

use crate::error::RentalResult;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const CONFIRMATION_SUBJECT: &str = "Your Rental Confirmation";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> RentalResult<()>;

    fn notifier_name(&self) -> &'static str;
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that only logs. Used when no email provider is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> RentalResult<()> {
        info!(to, subject, bytes = html.len(), "Email not sent (no provider configured)");
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

/// HTML body of the rental confirmation email
pub fn confirmation_email<T: Serialize + ?Sized>(details: &T) -> RentalResult<String> {
    let pretty = serde_json::to_string_pretty(details)?;
    Ok(format!(
        "<p>Thank you for renting with us! Here are your rental details:</p>\n<pre>{}</pre>",
        escape_html(&pretty)
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
