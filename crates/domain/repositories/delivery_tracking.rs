use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{
    delivery_counters::DeliveryCounters, enums::delivery_statuses::DeliveryStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStatusUpdate {
    pub message_log_id: Uuid,
    pub campaign_id: Uuid,
    pub previous_status: DeliveryStatus,
    pub status: DeliveryStatus,
    pub changed: bool,
    /// Counters after the update; `None` when the bucket did not change.
    pub counters: Option<DeliveryCounters>,
}

#[automock]
#[async_trait]
pub trait DeliveryTrackingRepository {
    /// Updates the log row matching `message_sid` and moves it between analytics buckets
    /// in one transaction. Returns `None` when no row has that sid.
    async fn apply_delivery_status(
        &self,
        message_sid: String,
        status: DeliveryStatus,
        error_message: Option<String>,
    ) -> Result<Option<DeliveryStatusUpdate>>;
}
