use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::billing::{BillingWebhookEvent, GatewaySubscription};

#[automock]
#[async_trait]
pub trait PaymentGateway {
    async fn create_customer(&self, user_id: Uuid, email: Option<String>) -> Result<String>;

    /// Returns the hosted checkout URL for the configured subscription price.
    async fn create_checkout_session(&self, customer_id: String, user_id: Uuid) -> Result<String>;

    async fn retrieve_subscription(&self, subscription_id: String) -> Result<GatewaySubscription>;

    /// Verifies the signature header and decodes the event.
    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<BillingWebhookEvent>;
}
