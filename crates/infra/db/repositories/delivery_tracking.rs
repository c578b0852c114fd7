use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::message_logs::MessageLogEntity,
        repositories::delivery_tracking::{DeliveryStatusUpdate, DeliveryTrackingRepository},
        value_objects::enums::delivery_statuses::DeliveryStatus,
    },
    infra::db::{
        postgres::{postgres_connection::PgPoolSquad, schema::message_logs},
        repositories::campaign_analytics::adjust_counters,
    },
};

pub struct DeliveryTrackingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DeliveryTrackingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DeliveryTrackingRepository for DeliveryTrackingPostgres {
    async fn apply_delivery_status(
        &self,
        message_sid: String,
        status: DeliveryStatus,
        error_message: Option<String>,
    ) -> Result<Option<DeliveryStatusUpdate>> {
        // Diesel is synchronous; keep it on the blocking threadpool.
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<DeliveryStatusUpdate>> {
            let mut conn = db_pool.get()?;

            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let Some(log) = message_logs::table
                    .filter(message_logs::message_sid.eq(&message_sid))
                    .select(MessageLogEntity::as_select())
                    .for_update()
                    .first::<MessageLogEntity>(conn)
                    .optional()?
                else {
                    return Ok(None);
                };

                let previous_status = DeliveryStatus::parse(&log.status);
                if previous_status == status {
                    return Ok(Some(DeliveryStatusUpdate {
                        message_log_id: log.id,
                        campaign_id: log.campaign_id,
                        previous_status,
                        status,
                        changed: false,
                        counters: None,
                    }));
                }

                update(message_logs::table.filter(message_logs::id.eq(log.id)))
                    .set((
                        message_logs::status.eq(status.to_string()),
                        message_logs::error_message.eq(error_message),
                        message_logs::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;

                let (from, to) = (previous_status.bucket(), status.bucket());
                let counters = if from != to {
                    Some(adjust_counters(conn, log.campaign_id, |counters| {
                        counters.transition(from, to)
                    })?)
                } else {
                    None
                };

                Ok(Some(DeliveryStatusUpdate {
                    message_log_id: log.id,
                    campaign_id: log.campaign_id,
                    previous_status,
                    status,
                    changed: true,
                    counters,
                }))
            })
            .context("failed to apply delivery status")
        })
        .await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            repositories::{
                campaign_analytics::CampaignAnalyticsRepository,
                campaign_dispatch::CampaignDispatchRepository,
            },
            value_objects::enums::campaign_statuses::CampaignStatus,
        },
        infra::db::{
            repositories::{
                campaign_analytics::CampaignAnalyticsPostgres,
                campaign_dispatch::CampaignDispatchPostgres,
            },
            test_support::{drop_group, pool_from_env, seed_campaign, seed_group, send_log},
        },
    };

    #[tokio::test]
    #[ignore = "needs DATABASE_URL with migrations applied"]
    async fn replayed_callback_leaves_counters_alone() -> Result<()> {
        let pool = pool_from_env()?;
        let group_id = seed_group(&pool, &[])?;
        let campaign_id = seed_campaign(&pool, group_id, CampaignStatus::Draft, None)?;
        let sid = format!("SM{}", campaign_id.simple());
        CampaignDispatchPostgres::new(Arc::clone(&pool))
            .record_send_attempt(send_log(campaign_id, Some(&sid), "sent"))
            .await?;
        let tracking = DeliveryTrackingPostgres::new(Arc::clone(&pool));
        let analytics = CampaignAnalyticsPostgres::new(Arc::clone(&pool));

        let first = tracking
            .apply_delivery_status(sid.clone(), DeliveryStatus::Delivered, None)
            .await?
            .context("log row not found")?;
        assert!(first.changed);
        let counters = first.counters.context("bucket change should adjust counters")?;
        assert_eq!((counters.delivered, counters.pending), (1, 0));
        let after_first = analytics.find_by_campaign_id(campaign_id).await?;

        let replay = tracking
            .apply_delivery_status(sid, DeliveryStatus::Delivered, None)
            .await?
            .context("log row not found")?;
        assert!(!replay.changed);
        assert_eq!(replay.counters, None);

        let after_replay = analytics.find_by_campaign_id(campaign_id).await?;
        assert_eq!(
            after_replay.map(|row| (row.total_count, row.delivered_count, row.pending_count)),
            after_first.map(|row| (row.total_count, row.delivered_count, row.pending_count)),
        );

        drop_group(&pool, group_id)
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL with migrations applied"]
    async fn unknown_sid_matches_nothing() -> Result<()> {
        let pool = pool_from_env()?;
        let tracking = DeliveryTrackingPostgres::new(pool);

        let update = tracking
            .apply_delivery_status(format!("SM{}", uuid::Uuid::new_v4().simple()), DeliveryStatus::Delivered, None)
            .await?;
        assert_eq!(update, None);

        Ok(())
    }
}
