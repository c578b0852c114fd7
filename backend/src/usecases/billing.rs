use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use textcast::domain::{
    entities::billing::UpsertBillingSubscriptionEntity,
    repositories::{billing::BillingRepository, payment_gateway::PaymentGateway},
    value_objects::{
        billing::{BillingSubscriptionDto, BillingWebhookEvent, CreateCheckoutResponse},
        enums::subscription_statuses::SubscriptionStatus,
    },
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("invalid webhook: {0}")]
    InvalidWebhook(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct BillingUseCase<R, G>
where
    R: BillingRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    billing_repo: Arc<R>,
    gateway: Arc<G>,
}

impl<R, G> BillingUseCase<R, G>
where
    R: BillingRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(billing_repo: Arc<R>, gateway: Arc<G>) -> Self {
        Self {
            billing_repo,
            gateway,
        }
    }

    /// Reuses the user's Stripe customer when one exists.
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        email: Option<String>,
    ) -> Result<CreateCheckoutResponse, BillingError> {
        let customer_id = match self.billing_repo.find_customer_id(user_id).await? {
            Some(customer_id) => customer_id,
            None => {
                let customer_id = self.gateway.create_customer(user_id, email).await?;
                self.billing_repo
                    .insert_customer(user_id, customer_id.clone())
                    .await?;
                info!(%user_id, %customer_id, "billing: stripe customer created");
                customer_id
            }
        };

        let checkout_url = self
            .gateway
            .create_checkout_session(customer_id, user_id)
            .await?;

        Ok(CreateCheckoutResponse { checkout_url })
    }

    pub async fn current_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<BillingSubscriptionDto>, BillingError> {
        Ok(self
            .billing_repo
            .find_subscription(user_id)
            .await?
            .map(BillingSubscriptionDto::from))
    }

    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), BillingError> {
        let event = self
            .gateway
            .verify_webhook(payload, signature_header)
            .map_err(|err| BillingError::InvalidWebhook(err.to_string()))?;

        match event {
            BillingWebhookEvent::CheckoutCompleted {
                user_id: Some(user_id),
                subscription_id: Some(subscription_id),
            } => {
                let subscription = self
                    .gateway
                    .retrieve_subscription(subscription_id)
                    .await?;
                self.billing_repo
                    .upsert_subscription(UpsertBillingSubscriptionEntity {
                        user_id,
                        stripe_subscription_id: subscription.id.clone(),
                        status: SubscriptionStatus::Active.to_string(),
                        current_period_end: subscription.current_period_end,
                        updated_at: Utc::now(),
                    })
                    .await?;
                info!(%user_id, subscription_id = %subscription.id, "billing: subscription activated");
            }
            BillingWebhookEvent::CheckoutCompleted { user_id, subscription_id } => {
                warn!(?user_id, ?subscription_id, "billing: checkout completed without user or subscription");
            }
            BillingWebhookEvent::SubscriptionUpdated(subscription) => {
                self.sync_status(subscription.id, subscription.status, subscription.current_period_end)
                    .await?;
            }
            BillingWebhookEvent::SubscriptionDeleted { subscription_id } => {
                self.sync_status(subscription_id, SubscriptionStatus::Canceled, None)
                    .await?;
            }
            BillingWebhookEvent::InvoicePaymentFailed {
                subscription_id: Some(subscription_id),
            } => {
                self.sync_status(subscription_id, SubscriptionStatus::PastDue, None)
                    .await?;
            }
            BillingWebhookEvent::InvoicePaymentFailed { subscription_id: None } => {
                debug!("billing: payment failure for a non-subscription invoice");
            }
            BillingWebhookEvent::Ignored { event_type } => {
                debug!(%event_type, "billing: webhook event ignored");
            }
        }

        Ok(())
    }

    async fn sync_status(
        &self,
        subscription_id: String,
        status: SubscriptionStatus,
        current_period_end: Option<chrono::DateTime<Utc>>,
    ) -> Result<(), BillingError> {
        let updated = self
            .billing_repo
            .update_subscription_status(subscription_id.clone(), status, current_period_end)
            .await?;
        if updated {
            info!(%subscription_id, %status, "billing: subscription status synced");
        } else {
            warn!(%subscription_id, %status, "billing: webhook for unknown subscription");
        }
        Ok(())
    }
}
