use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::billing::{BillingSubscriptionEntity, UpsertBillingSubscriptionEntity},
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[automock]
#[async_trait]
pub trait BillingRepository {
    async fn find_customer_id(&self, user_id: Uuid) -> Result<Option<String>>;

    async fn insert_customer(&self, user_id: Uuid, stripe_customer_id: String) -> Result<()>;

    async fn find_subscription(&self, user_id: Uuid) -> Result<Option<BillingSubscriptionEntity>>;

    async fn upsert_subscription(&self, entity: UpsertBillingSubscriptionEntity) -> Result<Uuid>;

    /// Returns false when no subscription has this Stripe id.
    async fn update_subscription_status(
        &self,
        stripe_subscription_id: String,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<bool>;
}
