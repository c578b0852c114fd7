use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::campaign_analytics::CampaignAnalyticsEntity,
    value_objects::delivery_counters::DeliveryCounters,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CountersReconciliation {
    /// The row was reconciled within the minimum interval and was left untouched.
    Skipped { last_reconciled_at: DateTime<Utc> },
    Reconciled {
        /// Running counters as they stood under the lock, before the rewrite.
        previous: DeliveryCounters,
        row: CampaignAnalyticsEntity,
    },
}

/// `Some(last)` when a reconcile at `now` would land inside `min_interval` of the last one.
pub fn reconciled_within(
    reconciled_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> Option<DateTime<Utc>> {
    reconciled_at.filter(|last| now - *last < min_interval)
}

#[automock]
#[async_trait]
pub trait CampaignAnalyticsRepository {
    async fn find_by_campaign_id(&self, campaign_id: Uuid)
    -> Result<Option<CampaignAnalyticsEntity>>;

    /// Rebuilds the running counters from the message log and stamps `reconciled_at = now`.
    /// The interval check, the recount and the write all happen under one row lock.
    async fn reconcile_counters(
        &self,
        campaign_id: Uuid,
        now: DateTime<Utc>,
        min_interval: Duration,
    ) -> Result<CountersReconciliation>;
}
