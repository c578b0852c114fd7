use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::campaigns::{CampaignEntity, InsertCampaignEntity};

#[automock]
#[async_trait]
pub trait CampaignRepository {
    async fn insert_campaign(&self, entity: InsertCampaignEntity) -> Result<CampaignEntity>;

    async fn find_owned_campaign(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CampaignEntity>>;

    /// Moves an owned `draft`/`scheduled` + `pending` campaign to `scheduled`.
    /// Returns `None` when the campaign is not in a schedulable state.
    async fn schedule_campaign(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        scheduled_for: DateTime<Utc>,
        timezone: Option<String>,
    ) -> Result<Option<CampaignEntity>>;
}
