use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use textcast::domain::{
    repositories::campaign_analytics::{CampaignAnalyticsRepository, CountersReconciliation},
    value_objects::delivery_counters::{DeliveryCounters, DeliveryStatsDto},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Reconciled too recently; nothing was recomputed.
    Skipped { last_reconciled_at: DateTime<Utc> },
    Reconciled(DeliveryStatsDto),
}

/// Rebuilds a campaign's running counters from its full message log.
pub struct ReconcileAnalyticsUseCase {
    repository: Arc<dyn CampaignAnalyticsRepository + Send + Sync>,
    min_interval: Duration,
}

impl ReconcileAnalyticsUseCase {
    pub fn new(
        repository: Arc<dyn CampaignAnalyticsRepository + Send + Sync>,
        min_interval_secs: i64,
    ) -> Self {
        Self {
            repository,
            min_interval: Duration::seconds(min_interval_secs.max(0)),
        }
    }

    pub async fn run(&self, campaign_id: Uuid, now: DateTime<Utc>) -> Result<ReconcileOutcome> {
        let (previous, row) = match self
            .repository
            .reconcile_counters(campaign_id, now, self.min_interval)
            .await?
        {
            CountersReconciliation::Skipped { last_reconciled_at } => {
                debug!(%campaign_id, %last_reconciled_at, "analytics: reconcile skipped");
                return Ok(ReconcileOutcome::Skipped { last_reconciled_at });
            }
            CountersReconciliation::Reconciled { previous, row } => (previous, row),
        };

        let recomputed = DeliveryCounters::from(&row);
        if previous != recomputed {
            warn!(
                %campaign_id,
                running = ?previous,
                recomputed = ?recomputed,
                "analytics: running counters drifted from message log"
            );
        }

        let summary = recomputed.summary();
        info!(
            %campaign_id,
            total = summary.total,
            delivery_rate = summary.delivery_rate,
            "analytics: counters reconciled"
        );
        Ok(ReconcileOutcome::Reconciled(summary))
    }
}
