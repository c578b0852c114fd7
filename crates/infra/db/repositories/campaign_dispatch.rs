use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            campaigns::CampaignEntity, contacts::ContactEntity,
            message_logs::InsertMessageLogEntity,
        },
        repositories::campaign_dispatch::{CampaignDispatchRepository, CampaignWithContacts},
        value_objects::enums::{
            campaign_statuses::CampaignStatus, delivery_statuses::DeliveryStatus,
            processing_statuses::ProcessingStatus,
        },
    },
    infra::db::{
        postgres::{
            postgres_connection::PgPoolSquad,
            schema::{campaigns, contacts, message_logs},
        },
        repositories::campaign_analytics::adjust_counters,
    },
};

pub struct CampaignDispatchPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CampaignDispatchPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CampaignDispatchRepository for CampaignDispatchPostgres {
    async fn claim_due_campaigns(
        &self,
        now: DateTime<Utc>,
        campaign_id: Option<Uuid>,
    ) -> Result<Vec<CampaignEntity>> {
        // Diesel is synchronous; keep it on the blocking threadpool.
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<CampaignEntity>> {
            let mut conn = db_pool.get()?;

            // A single UPDATE ... RETURNING: rows another trigger already flipped no longer
            // match the filter, so each campaign is handed out once.
            let due = campaigns::status
                .eq(CampaignStatus::Scheduled.to_string())
                .and(campaigns::processing_status.eq(ProcessingStatus::Pending.to_string()))
                .and(campaigns::scheduled_for.le(now));
            let claim = (
                campaigns::status.eq(CampaignStatus::Processing.to_string()),
                campaigns::processing_status.eq(ProcessingStatus::Processing.to_string()),
                campaigns::updated_at.eq(now),
            );

            let claimed = match campaign_id {
                Some(id) => update(campaigns::table.filter(due.and(campaigns::id.eq(id))))
                    .set(claim)
                    .returning(CampaignEntity::as_returning())
                    .get_results::<CampaignEntity>(&mut conn)?,
                None => update(campaigns::table.filter(due))
                    .set(claim)
                    .returning(CampaignEntity::as_returning())
                    .get_results::<CampaignEntity>(&mut conn)?,
            };

            Ok(claimed)
        })
        .await??)
    }

    async fn claim_campaign_for_send(&self, campaign_id: Uuid) -> Result<Option<CampaignEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignEntity>> {
            let mut conn = db_pool.get()?;

            let claimed = update(
                campaigns::table
                    .filter(campaigns::id.eq(campaign_id))
                    .filter(campaigns::status.eq_any([
                        CampaignStatus::Draft.to_string(),
                        CampaignStatus::Scheduled.to_string(),
                    ]))
                    .filter(campaigns::processing_status.eq(ProcessingStatus::Pending.to_string())),
            )
            .set((
                campaigns::status.eq(CampaignStatus::Processing.to_string()),
                campaigns::processing_status.eq(ProcessingStatus::Processing.to_string()),
                campaigns::updated_at.eq(now),
            ))
            .returning(CampaignEntity::as_returning())
            .get_result::<CampaignEntity>(&mut conn)
            .optional()?;

            Ok(claimed)
        })
        .await??)
    }

    async fn find_campaign(&self, campaign_id: Uuid) -> Result<Option<CampaignEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignEntity>> {
            let mut conn = db_pool.get()?;

            let campaign = campaigns::table
                .filter(campaigns::id.eq(campaign_id))
                .select(CampaignEntity::as_select())
                .first::<CampaignEntity>(&mut conn)
                .optional()?;

            Ok(campaign)
        })
        .await??)
    }

    async fn find_campaign_with_contacts(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignWithContacts>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignWithContacts>> {
            let mut conn = db_pool.get()?;

            let Some(campaign) = campaigns::table
                .filter(campaigns::id.eq(campaign_id))
                .select(CampaignEntity::as_select())
                .first::<CampaignEntity>(&mut conn)
                .optional()?
            else {
                return Ok(None);
            };

            let contacts = contacts::table
                .filter(contacts::group_id.eq(campaign.group_id))
                .select(ContactEntity::as_select())
                .order(contacts::created_at.asc())
                .load::<ContactEntity>(&mut conn)?;

            Ok(Some(CampaignWithContacts { campaign, contacts }))
        })
        .await??)
    }

    async fn record_send_attempt(&self, log: InsertMessageLogEntity) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get()?;
            let campaign_id = log.campaign_id;
            let bucket = DeliveryStatus::parse(&log.status).bucket();

            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let log_id = insert_into(message_logs::table)
                    .values(&log)
                    .returning(message_logs::id)
                    .get_result::<Uuid>(conn)?;

                adjust_counters(conn, campaign_id, |counters| counters.record(bucket))?;

                Ok(log_id)
            })
            .with_context(|| format!("failed to record send attempt for campaign {campaign_id}"))
        })
        .await??)
    }

    async fn mark_campaign_completed(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();
        let processing_status = match status {
            CampaignStatus::Error => ProcessingStatus::Error,
            _ => ProcessingStatus::Completed,
        };

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(campaigns::table.filter(campaigns::id.eq(campaign_id)))
                .set((
                    campaigns::status.eq(status.to_string()),
                    campaigns::processing_status.eq(processing_status.to_string()),
                    campaigns::sent_at.eq(Some(now)),
                    campaigns::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await??;

        Ok(())
    }

    async fn mark_campaign_failed(&self, campaign_id: Uuid, error_message: String) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(campaigns::table.filter(campaigns::id.eq(campaign_id)))
                .set((
                    campaigns::status.eq(CampaignStatus::Error.to_string()),
                    campaigns::processing_status.eq(ProcessingStatus::Error.to_string()),
                    campaigns::error_message.eq(Some(error_message)),
                    campaigns::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await??;

        Ok(())
    }
}
