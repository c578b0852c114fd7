use serde::Serialize;

use crate::domain::{
    entities::campaign_analytics::CampaignAnalyticsEntity,
    value_objects::enums::delivery_statuses::{DeliveryBucket, DeliveryStatus},
};

/// Per-campaign delivery tallies. This is the only place "delivery rate" is defined;
/// the running counters, the reconciliation job and the dashboard all go through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryCounters {
    pub total: i32,
    pub delivered: i32,
    pub failed: i32,
    pub pending: i32,
}

impl DeliveryCounters {
    pub fn from_statuses<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counters = Self::default();
        for status in statuses {
            counters.record(DeliveryStatus::parse(status.as_ref()).bucket());
        }
        counters
    }

    /// Counts one new message.
    pub fn record(&mut self, bucket: DeliveryBucket) {
        self.total += 1;
        *self.bucket_mut(bucket) += 1;
    }

    /// Moves one existing message between buckets. Total is unchanged.
    pub fn transition(&mut self, from: DeliveryBucket, to: DeliveryBucket) {
        if from == to {
            return;
        }
        let source = self.bucket_mut(from);
        *source = (*source - 1).max(0);
        *self.bucket_mut(to) += 1;
    }

    /// delivered / total × 100, or 0 for a campaign with no messages.
    pub fn delivery_rate(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        f64::from(self.delivered) / f64::from(self.total) * 100.0
    }

    pub fn summary(&self) -> DeliveryStatsDto {
        DeliveryStatsDto {
            total: self.total,
            delivered: self.delivered,
            failed: self.failed,
            pending: self.pending,
            delivery_rate: self.delivery_rate(),
        }
    }

    fn bucket_mut(&mut self, bucket: DeliveryBucket) -> &mut i32 {
        match bucket {
            DeliveryBucket::Delivered => &mut self.delivered,
            DeliveryBucket::Failed => &mut self.failed,
            DeliveryBucket::Pending => &mut self.pending,
        }
    }
}

impl From<&CampaignAnalyticsEntity> for DeliveryCounters {
    fn from(value: &CampaignAnalyticsEntity) -> Self {
        Self {
            total: value.total_count,
            delivered: value.delivered_count,
            failed: value.failed_count,
            pending: value.pending_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatsDto {
    pub total: i32,
    pub delivered: i32,
    pub failed: i32,
    pub pending: i32,
    pub delivery_rate: f64,
}
