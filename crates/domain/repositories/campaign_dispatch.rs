use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        campaigns::CampaignEntity, contacts::ContactEntity, message_logs::InsertMessageLogEntity,
    },
    value_objects::enums::campaign_statuses::CampaignStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignWithContacts {
    pub campaign: CampaignEntity,
    pub contacts: Vec<ContactEntity>,
}

#[automock]
#[async_trait]
pub trait CampaignDispatchRepository {
    /// Atomically flips every due `scheduled`/`pending` campaign to `processing` and returns
    /// exactly the rows this call claimed.
    async fn claim_due_campaigns(
        &self,
        now: DateTime<Utc>,
        campaign_id: Option<Uuid>,
    ) -> Result<Vec<CampaignEntity>>;

    /// Claims a `draft` or `scheduled` campaign regardless of its send time.
    async fn claim_campaign_for_send(&self, campaign_id: Uuid) -> Result<Option<CampaignEntity>>;

    async fn find_campaign(&self, campaign_id: Uuid) -> Result<Option<CampaignEntity>>;

    async fn find_campaign_with_contacts(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignWithContacts>>;

    /// Inserts one message log row and counts it in the campaign's running analytics.
    async fn record_send_attempt(&self, log: InsertMessageLogEntity) -> Result<Uuid>;

    async fn mark_campaign_completed(&self, campaign_id: Uuid, status: CampaignStatus)
    -> Result<()>;

    async fn mark_campaign_failed(&self, campaign_id: Uuid, error_message: String) -> Result<()>;
}
