use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::campaign_analytics::{
            CampaignAnalyticsCountersChangeset, CampaignAnalyticsEntity,
        },
        repositories::campaign_analytics::{
            CampaignAnalyticsRepository, CountersReconciliation, reconciled_within,
        },
        value_objects::delivery_counters::DeliveryCounters,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{campaign_analytics, message_logs},
    },
};

pub struct CampaignAnalyticsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CampaignAnalyticsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Applies `change` to the campaign's running counters under a row lock. Must be called
/// inside the transaction that wrote the message log change it accounts for.
pub(crate) fn adjust_counters<F>(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    change: F,
) -> Result<DeliveryCounters>
where
    F: FnOnce(&mut DeliveryCounters),
{
    let current = lock_analytics_row(conn, campaign_id)?;

    let mut counters = DeliveryCounters::from(&current);
    change(&mut counters);
    write_counters(conn, campaign_id, &counters, None)?;

    Ok(counters)
}

/// Creates the row if missing, then selects it `FOR UPDATE`.
fn lock_analytics_row(conn: &mut PgConnection, campaign_id: Uuid) -> Result<CampaignAnalyticsEntity> {
    ensure_analytics_row(conn, campaign_id)?;

    let row = campaign_analytics::table
        .filter(campaign_analytics::campaign_id.eq(campaign_id))
        .select(CampaignAnalyticsEntity::as_select())
        .for_update()
        .first::<CampaignAnalyticsEntity>(conn)?;
    Ok(row)
}

fn ensure_analytics_row(conn: &mut PgConnection, campaign_id: Uuid) -> Result<()> {
    insert_into(campaign_analytics::table)
        .values((
            campaign_analytics::campaign_id.eq(campaign_id),
            campaign_analytics::updated_at.eq(Utc::now()),
        ))
        .on_conflict(campaign_analytics::campaign_id)
        .do_nothing()
        .execute(conn)?;
    Ok(())
}

fn write_counters(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    counters: &DeliveryCounters,
    reconciled_at: Option<DateTime<Utc>>,
) -> Result<CampaignAnalyticsEntity> {
    let changeset = CampaignAnalyticsCountersChangeset {
        total_count: counters.total,
        delivered_count: counters.delivered,
        failed_count: counters.failed,
        pending_count: counters.pending,
        delivery_rate: counters.delivery_rate(),
        reconciled_at,
        updated_at: Utc::now(),
    };

    let row = update(campaign_analytics::table.filter(campaign_analytics::campaign_id.eq(campaign_id)))
        .set(&changeset)
        .returning(CampaignAnalyticsEntity::as_returning())
        .get_result::<CampaignAnalyticsEntity>(conn)?;

    Ok(row)
}

#[async_trait]
impl CampaignAnalyticsRepository for CampaignAnalyticsPostgres {
    async fn find_by_campaign_id(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignAnalyticsEntity>> {
        // Diesel is synchronous; keep it on the blocking threadpool.
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignAnalyticsEntity>> {
            let mut conn = db_pool.get()?;

            let row = campaign_analytics::table
                .filter(campaign_analytics::campaign_id.eq(campaign_id))
                .select(CampaignAnalyticsEntity::as_select())
                .first::<CampaignAnalyticsEntity>(&mut conn)
                .optional()?;

            Ok(row)
        })
        .await??)
    }

    async fn reconcile_counters(
        &self,
        campaign_id: Uuid,
        now: DateTime<Utc>,
        min_interval: Duration,
    ) -> Result<CountersReconciliation> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<CountersReconciliation> {
            let mut conn = db_pool.get()?;

            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let current = lock_analytics_row(conn, campaign_id)?;
                if let Some(last_reconciled_at) =
                    reconciled_within(current.reconciled_at, now, min_interval)
                {
                    return Ok(CountersReconciliation::Skipped { last_reconciled_at });
                }

                // Webhooks adjust counters only after taking this same lock, so the log
                // read here cannot be overtaken by a concurrent increment.
                let statuses = message_logs::table
                    .filter(message_logs::campaign_id.eq(campaign_id))
                    .select(message_logs::status)
                    .load::<String>(conn)?;
                let recomputed = DeliveryCounters::from_statuses(&statuses);
                let row = write_counters(conn, campaign_id, &recomputed, Some(now))?;

                Ok(CountersReconciliation::Reconciled {
                    previous: DeliveryCounters::from(&current),
                    row,
                })
            })
            .with_context(|| format!("failed to reconcile analytics for campaign {campaign_id}"))
        })
        .await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            repositories::campaign_dispatch::CampaignDispatchRepository,
            value_objects::enums::campaign_statuses::CampaignStatus,
        },
        infra::db::{
            repositories::campaign_dispatch::CampaignDispatchPostgres,
            test_support::{drop_group, pool_from_env, seed_campaign, seed_group, send_log},
        },
    };

    #[tokio::test]
    #[ignore = "needs DATABASE_URL with migrations applied"]
    async fn concurrent_reconciles_recount_once() -> Result<()> {
        let pool = pool_from_env()?;
        let group_id = seed_group(&pool, &[])?;
        let campaign_id = seed_campaign(&pool, group_id, CampaignStatus::Draft, None)?;
        let dispatch = CampaignDispatchPostgres::new(Arc::clone(&pool));
        for status in ["delivered", "undelivered", "sent"] {
            dispatch.record_send_attempt(send_log(campaign_id, None, status)).await?;
        }
        let repository = CampaignAnalyticsPostgres::new(Arc::clone(&pool));
        let now = Utc::now();
        let interval = Duration::minutes(5);

        let (first, second) = tokio::join!(
            repository.reconcile_counters(campaign_id, now, interval),
            repository.reconcile_counters(campaign_id, now, interval),
        );
        let outcomes = [first?, second?];

        let reconciled: Vec<&CampaignAnalyticsEntity> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                CountersReconciliation::Reconciled { row, .. } => Some(row),
                CountersReconciliation::Skipped { .. } => None,
            })
            .collect();
        assert_eq!(reconciled.len(), 1);
        assert_eq!(
            DeliveryCounters::from(reconciled[0]),
            DeliveryCounters {
                total: 3,
                delivered: 1,
                failed: 1,
                pending: 1,
            }
        );

        let later = repository
            .reconcile_counters(campaign_id, now + Duration::minutes(6), interval)
            .await?;
        assert!(matches!(later, CountersReconciliation::Reconciled { .. }));

        drop_group(&pool, group_id)
    }
}
