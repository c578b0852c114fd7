use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use textcast::domain::{
    repositories::{
        campaign_analytics::CampaignAnalyticsRepository, campaigns::CampaignRepository,
        contacts::ContactRepository,
    },
    value_objects::{
        campaigns::{
            CampaignDto, CampaignMessage, CampaignMessageError, CreateCampaignModel,
            ScheduleCampaignModel,
        },
        delivery_counters::{DeliveryCounters, DeliveryStatsDto},
    },
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("name is required")]
    MissingName,
    #[error(transparent)]
    InvalidMessage(#[from] CampaignMessageError),
    #[error("Contact group not found")]
    GroupNotFound,
    #[error("Campaign not found")]
    CampaignNotFound,
    #[error("campaign cannot be scheduled while {0}")]
    NotSchedulable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CampaignError::MissingName
            | CampaignError::InvalidMessage(_)
            | CampaignError::GroupNotFound
            | CampaignError::NotSchedulable(_) => StatusCode::BAD_REQUEST,
            CampaignError::CampaignNotFound => StatusCode::NOT_FOUND,
            CampaignError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CampaignUseCase<C, G, A>
where
    C: CampaignRepository + Send + Sync + 'static,
    G: ContactRepository + Send + Sync + 'static,
    A: CampaignAnalyticsRepository + Send + Sync + 'static,
{
    campaign_repo: Arc<C>,
    contact_repo: Arc<G>,
    analytics_repo: Arc<A>,
}

impl<C, G, A> CampaignUseCase<C, G, A>
where
    C: CampaignRepository + Send + Sync + 'static,
    G: ContactRepository + Send + Sync + 'static,
    A: CampaignAnalyticsRepository + Send + Sync + 'static,
{
    pub fn new(campaign_repo: Arc<C>, contact_repo: Arc<G>, analytics_repo: Arc<A>) -> Self {
        Self {
            campaign_repo,
            contact_repo,
            analytics_repo,
        }
    }

    pub async fn create_campaign(
        &self,
        user_id: Uuid,
        model: CreateCampaignModel,
    ) -> Result<CampaignDto, CampaignError> {
        if model.name.trim().is_empty() {
            return Err(CampaignError::MissingName);
        }
        let message = CampaignMessage::parse(&model.message)?;

        let owns_group = self
            .contact_repo
            .find_group(model.group_id)
            .await?
            .is_some_and(|group| group.user_id == user_id);
        if !owns_group {
            return Err(CampaignError::GroupNotFound);
        }

        let campaign = self
            .campaign_repo
            .insert_campaign(model.to_entity(user_id, message))
            .await?;
        info!(%user_id, campaign_id = %campaign.id, "campaigns: draft created");

        Ok(campaign.into())
    }

    /// An omitted `scheduledFor` means "as soon as the next trigger run".
    pub async fn schedule_campaign(
        &self,
        user_id: Uuid,
        campaign_id: Uuid,
        model: ScheduleCampaignModel,
        now: DateTime<Utc>,
    ) -> Result<CampaignDto, CampaignError> {
        let current = self
            .campaign_repo
            .find_owned_campaign(campaign_id, user_id)
            .await?
            .ok_or(CampaignError::CampaignNotFound)?;

        let scheduled_for = model.scheduled_for.unwrap_or(now);
        let timezone = model
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty());

        match self
            .campaign_repo
            .schedule_campaign(campaign_id, user_id, scheduled_for, timezone)
            .await?
        {
            Some(campaign) => {
                info!(%campaign_id, %scheduled_for, "campaigns: scheduled");
                Ok(campaign.into())
            }
            None => {
                warn!(
                    %campaign_id,
                    status = %current.status,
                    processing_status = %current.processing_status,
                    "campaigns: schedule rejected"
                );
                Err(CampaignError::NotSchedulable(current.status))
            }
        }
    }

    /// Reads the running counters. A campaign that has not sent anything reports zeros.
    pub async fn campaign_stats(
        &self,
        user_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<DeliveryStatsDto, CampaignError> {
        self.campaign_repo
            .find_owned_campaign(campaign_id, user_id)
            .await?
            .ok_or(CampaignError::CampaignNotFound)?;

        let counters = self
            .analytics_repo
            .find_by_campaign_id(campaign_id)
            .await?
            .map(|row| DeliveryCounters::from(&row))
            .unwrap_or_default();

        Ok(counters.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockall::predicate::{always, eq};
    use textcast::domain::{
        entities::{
            campaign_analytics::CampaignAnalyticsEntity, campaigns::CampaignEntity,
            contacts::ContactGroupEntity,
        },
        repositories::{
            campaign_analytics::MockCampaignAnalyticsRepository,
            campaigns::MockCampaignRepository, contacts::MockContactRepository,
        },
    };

    fn sample_campaign(id: Uuid, user_id: Uuid, status: &str, processing: &str) -> CampaignEntity {
        let now = Utc::now();
        CampaignEntity {
            id,
            user_id,
            name: "Spring promo".to_string(),
            message: "20% off this weekend".to_string(),
            media_url: None,
            group_id: Uuid::new_v4(),
            scheduled_for: None,
            timezone: None,
            status: status.to_string(),
            processing_status: processing.to_string(),
            error_message: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_model(group_id: Uuid, message: &str) -> CreateCampaignModel {
        CreateCampaignModel {
            name: "Spring promo".to_string(),
            message: message.to_string(),
            media_url: None,
            group_id,
        }
    }

    fn usecase(
        campaigns: MockCampaignRepository,
        contacts: MockContactRepository,
        analytics: MockCampaignAnalyticsRepository,
    ) -> CampaignUseCase<MockCampaignRepository, MockContactRepository, MockCampaignAnalyticsRepository>
    {
        CampaignUseCase::new(Arc::new(campaigns), Arc::new(contacts), Arc::new(analytics))
    }

    #[tokio::test]
    async fn creates_draft_in_owned_group() {
        let user_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();

        let mut contacts = MockContactRepository::new();
        contacts
            .expect_find_group()
            .with(eq(group_id))
            .returning(move |_| {
                Ok(Some(ContactGroupEntity {
                    id: group_id,
                    user_id,
                    name: "VIP".to_string(),
                    created_at: Utc::now(),
                }))
            });

        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_insert_campaign()
            .withf(move |entity| {
                entity.user_id == user_id && entity.status == "draft" && entity.group_id == group_id
            })
            .returning(move |entity| {
                let mut campaign = sample_campaign(Uuid::new_v4(), user_id, "draft", "pending");
                campaign.message = entity.message;
                Ok(campaign)
            });

        let dto = usecase(campaigns, contacts, MockCampaignAnalyticsRepository::new())
            .create_campaign(user_id, create_model(group_id, "  Hello there  "))
            .await
            .unwrap();

        assert_eq!(dto.status, "draft");
        assert_eq!(dto.message, "Hello there");
    }

    #[tokio::test]
    async fn rejects_oversized_message_before_touching_storage() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns.expect_insert_campaign().never();
        let mut contacts = MockContactRepository::new();
        contacts.expect_find_group().never();

        let err = usecase(campaigns, contacts, MockCampaignAnalyticsRepository::new())
            .create_campaign(Uuid::new_v4(), create_model(Uuid::new_v4(), &"x".repeat(161)))
            .await
            .unwrap_err();

        assert!(matches!(err, CampaignError::InvalidMessage(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_group_owned_by_someone_else() {
        let group_id = Uuid::new_v4();
        let mut contacts = MockContactRepository::new();
        contacts.expect_find_group().returning(move |_| {
            Ok(Some(ContactGroupEntity {
                id: group_id,
                user_id: Uuid::new_v4(),
                name: "Other".to_string(),
                created_at: Utc::now(),
            }))
        });
        let mut campaigns = MockCampaignRepository::new();
        campaigns.expect_insert_campaign().never();

        let err = usecase(campaigns, contacts, MockCampaignAnalyticsRepository::new())
            .create_campaign(Uuid::new_v4(), create_model(group_id, "hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, CampaignError::GroupNotFound));
    }

    #[tokio::test]
    async fn schedule_defaults_to_now() {
        let user_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let now = Utc::now();

        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_owned_campaign()
            .with(eq(campaign_id), eq(user_id))
            .returning(move |id, user| Ok(Some(sample_campaign(id, user, "draft", "pending"))));
        campaigns
            .expect_schedule_campaign()
            .with(eq(campaign_id), eq(user_id), eq(now), eq(Some("Asia/Bangkok".to_string())))
            .returning(move |id, user, at, tz| {
                let mut campaign = sample_campaign(id, user, "scheduled", "pending");
                campaign.scheduled_for = Some(at);
                campaign.timezone = tz;
                Ok(Some(campaign))
            });

        let dto = usecase(
            campaigns,
            MockContactRepository::new(),
            MockCampaignAnalyticsRepository::new(),
        )
        .schedule_campaign(
            user_id,
            campaign_id,
            ScheduleCampaignModel {
                scheduled_for: None,
                timezone: Some(" Asia/Bangkok ".to_string()),
            },
            now,
        )
        .await
        .unwrap();

        assert_eq!(dto.status, "scheduled");
        assert_eq!(dto.scheduled_for, Some(now));
    }

    #[tokio::test]
    async fn finished_campaigns_cannot_be_rescheduled() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_owned_campaign()
            .returning(|id, user| Ok(Some(sample_campaign(id, user, "error", "error"))));
        campaigns
            .expect_schedule_campaign()
            .with(always(), always(), always(), always())
            .returning(|_, _, _, _| Ok(None));

        let err = usecase(
            campaigns,
            MockContactRepository::new(),
            MockCampaignAnalyticsRepository::new(),
        )
        .schedule_campaign(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ScheduleCampaignModel {
                scheduled_for: Some(Utc::now() + Duration::hours(1)),
                timezone: None,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CampaignError::NotSchedulable(ref status) if status == "error"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_come_from_running_counters() {
        let campaign_id = Uuid::new_v4();
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_owned_campaign()
            .returning(|id, user| Ok(Some(sample_campaign(id, user, "sent", "completed"))));

        let mut analytics = MockCampaignAnalyticsRepository::new();
        analytics
            .expect_find_by_campaign_id()
            .with(eq(campaign_id))
            .returning(|id| {
                Ok(Some(CampaignAnalyticsEntity {
                    campaign_id: id,
                    total_count: 4,
                    delivered_count: 3,
                    failed_count: 1,
                    pending_count: 0,
                    delivery_rate: 75.0,
                    open_rate: 0.0,
                    click_rate: 0.0,
                    cost_minor: 0,
                    revenue_minor: 0,
                    reconciled_at: None,
                    updated_at: Utc::now(),
                }))
            });

        let stats = usecase(campaigns, MockContactRepository::new(), analytics)
            .campaign_stats(Uuid::new_v4(), campaign_id)
            .await
            .unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.delivery_rate, 75.0);
    }

    #[tokio::test]
    async fn stats_without_analytics_row_are_zero() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_owned_campaign()
            .returning(|id, user| Ok(Some(sample_campaign(id, user, "draft", "pending"))));
        let mut analytics = MockCampaignAnalyticsRepository::new();
        analytics.expect_find_by_campaign_id().returning(|_| Ok(None));

        let stats = usecase(campaigns, MockContactRepository::new(), analytics)
            .campaign_stats(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(stats, DeliveryCounters::default().summary());
    }

    #[tokio::test]
    async fn stats_for_foreign_campaign_are_not_found() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns.expect_find_owned_campaign().returning(|_, _| Ok(None));
        let mut analytics = MockCampaignAnalyticsRepository::new();
        analytics.expect_find_by_campaign_id().never();

        let err = usecase(campaigns, MockContactRepository::new(), analytics)
            .campaign_stats(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
