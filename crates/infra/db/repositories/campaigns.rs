use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::campaigns::{CampaignEntity, InsertCampaignEntity},
        repositories::campaigns::CampaignRepository,
        value_objects::enums::{
            campaign_statuses::CampaignStatus, processing_statuses::ProcessingStatus,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::campaigns},
};

pub struct CampaignPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CampaignPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CampaignRepository for CampaignPostgres {
    async fn insert_campaign(&self, entity: InsertCampaignEntity) -> Result<CampaignEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<CampaignEntity> {
            let mut conn = db_pool.get()?;

            let campaign = insert_into(campaigns::table)
                .values(&entity)
                .returning(CampaignEntity::as_returning())
                .get_result::<CampaignEntity>(&mut conn)?;

            Ok(campaign)
        })
        .await??)
    }

    async fn find_owned_campaign(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CampaignEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignEntity>> {
            let mut conn = db_pool.get()?;

            let campaign = campaigns::table
                .filter(campaigns::id.eq(campaign_id))
                .filter(campaigns::user_id.eq(user_id))
                .select(CampaignEntity::as_select())
                .first::<CampaignEntity>(&mut conn)
                .optional()?;

            Ok(campaign)
        })
        .await??)
    }

    async fn schedule_campaign(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        scheduled_for: DateTime<Utc>,
        timezone: Option<String>,
    ) -> Result<Option<CampaignEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        Ok(task::spawn_blocking(move || -> Result<Option<CampaignEntity>> {
            let mut conn = db_pool.get()?;

            // Conditional on the current state so a campaign the scheduler already claimed
            // cannot be pushed back into the queue.
            let campaign = update(
                campaigns::table
                    .filter(campaigns::id.eq(campaign_id))
                    .filter(campaigns::user_id.eq(user_id))
                    .filter(campaigns::status.eq_any([
                        CampaignStatus::Draft.to_string(),
                        CampaignStatus::Scheduled.to_string(),
                    ]))
                    .filter(campaigns::processing_status.eq(ProcessingStatus::Pending.to_string())),
            )
            .set((
                campaigns::status.eq(CampaignStatus::Scheduled.to_string()),
                campaigns::scheduled_for.eq(Some(scheduled_for)),
                campaigns::timezone.eq(timezone),
                campaigns::updated_at.eq(now),
            ))
            .returning(CampaignEntity::as_returning())
            .get_result::<CampaignEntity>(&mut conn)
            .optional()?;

            Ok(campaign)
        })
        .await??)
    }
}
