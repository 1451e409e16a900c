//! # Payment Reconciliation
//!
//! Applies verified gateway webhooks to rentals. A rental's payment status
//! moves to `Paid` here and nowhere else.

use crate::error::{RentalError, RentalResult};
use crate::gateway::SharedPaymentGateway;
use crate::money::{Amount, Currency};
use crate::order::{WebhookEvent, WebhookEventType, METADATA_RENTAL_ID, METADATA_USER_ID};
use crate::records::{Payment, PaymentStatus, Rental};
use crate::repository::Repository;
use crate::store::SharedDocumentStore;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// What a webhook delivery did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Rental marked paid
    RentalPaid { rental_id: String },
    /// Rental was already paid (redelivery)
    AlreadyPaid { rental_id: String },
    /// Event type needs no action
    Ignored,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkPaid {
    payment_status: PaymentStatus,
}

/// Verifies gateway callbacks and updates rentals and payments
#[derive(Clone)]
pub struct PaymentReconciler {
    gateway: SharedPaymentGateway,
    rentals: Repository<Rental>,
    payments: Repository<Payment>,
    currency: Currency,
}

impl PaymentReconciler {
    pub fn new(gateway: SharedPaymentGateway, store: SharedDocumentStore, currency: Currency) -> Self {
        Self {
            gateway,
            rentals: Repository::new(store.clone()),
            payments: Repository::new(store),
            currency,
        }
    }

    /// Verify and apply one webhook delivery. Nothing is written unless the
    /// signature checks out.
    #[instrument(skip(self, payload, signature), fields(provider = self.gateway.provider_name()))]
    pub async fn handle(&self, payload: &[u8], signature: &str) -> RentalResult<WebhookOutcome> {
        let event = self.gateway.verify_webhook(payload, signature).await?;
        info!(event_id = %event.event_id, event_type = ?event.event_type, "Webhook verified");

        match event.event_type {
            WebhookEventType::CheckoutCompleted => self.checkout_completed(&event).await,
            _ => Ok(WebhookOutcome::Ignored),
        }
    }

    async fn checkout_completed(&self, event: &WebhookEvent) -> RentalResult<WebhookOutcome> {
        let (Some(rental_id), Some(user_id)) = (
            event.metadata_value(METADATA_RENTAL_ID),
            event.metadata_value(METADATA_USER_ID),
        ) else {
            warn!(event_id = %event.event_id, "Completed checkout without rental metadata");
            return Err(RentalError::WebhookParse(
                "Missing metadata: userId or rentalId".to_string(),
            ));
        };

        let rental = self.rentals.get(rental_id).await?;
        if rental.user_id.as_deref().is_some_and(|owner| owner != user_id) {
            warn!(rental_id, user_id, "Webhook user does not match rental owner");
        }
        if rental.is_paid() {
            info!(rental_id, "Rental already paid");
            return Ok(WebhookOutcome::AlreadyPaid {
                rental_id: rental_id.to_string(),
            });
        }

        self.rentals
            .patch(
                rental_id,
                &MarkPaid {
                    payment_status: PaymentStatus::Paid,
                },
            )
            .await?;
        info!(rental_id, user_id, "Rental marked paid");

        self.record_payment(event, &rental).await;

        Ok(WebhookOutcome::RentalPaid {
            rental_id: rental_id.to_string(),
        })
    }

    /// Store a Completed payment for the rental. Failures are logged only;
    /// the rental is already marked paid.
    async fn record_payment(&self, event: &WebhookEvent, rental: &Rental) {
        let currency = event.currency.unwrap_or(self.currency);
        let amount = event
            .amount_paid
            .map(|minor| Amount::from_minor_units(minor, currency))
            .unwrap_or(rental.total_price);
        let payment = Payment::completed(
            &rental.id,
            amount,
            currency.to_string(),
            event
                .payment_intent_id
                .clone()
                .or_else(|| event.session_id.clone()),
        );

        if let Err(e) = self.payments.create(&payment).await {
            error!(rental_id = %rental.id, error = %e, "Failed to record payment");
        }
    }
}
