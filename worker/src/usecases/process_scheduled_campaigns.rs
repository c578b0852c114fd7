use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use textcast::domain::{
    repositories::campaign_dispatch::CampaignDispatchRepository,
    value_objects::enums::campaign_statuses::CampaignStatus,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::dispatch_campaign::CampaignDispatcher;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledRunSummary {
    pub processed: usize,
    pub sent: usize,
    pub partially_failed: usize,
    pub failed: usize,
}

pub struct ProcessScheduledCampaignsUseCase {
    repository: Arc<dyn CampaignDispatchRepository + Send + Sync>,
    dispatcher: Arc<dyn CampaignDispatcher + Send + Sync>,
}

impl ProcessScheduledCampaignsUseCase {
    pub fn new(
        repository: Arc<dyn CampaignDispatchRepository + Send + Sync>,
        dispatcher: Arc<dyn CampaignDispatcher + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Claims every campaign due at `now` (or just `campaign_id`) and dispatches the claimed
    /// set concurrently, waiting for all of them to settle.
    pub async fn run(
        &self,
        now: DateTime<Utc>,
        campaign_id: Option<Uuid>,
    ) -> Result<ScheduledRunSummary> {
        let claimed = self.repository.claim_due_campaigns(now, campaign_id).await?;
        if claimed.is_empty() {
            info!(only = ?campaign_id, "scheduler: no campaigns due");
            return Ok(ScheduledRunSummary::default());
        }

        info!(claimed = claimed.len(), "scheduler: dispatching due campaigns");

        let results = join_all(
            claimed
                .iter()
                .map(|campaign| self.dispatcher.dispatch_claimed(campaign.id)),
        )
        .await;

        let mut summary = ScheduledRunSummary {
            processed: claimed.len(),
            ..Default::default()
        };
        for (campaign, result) in claimed.iter().zip(results) {
            match result {
                Ok(outcome) => match outcome.status {
                    CampaignStatus::Sent => summary.sent += 1,
                    CampaignStatus::PartiallyFailed => summary.partially_failed += 1,
                    _ => summary.failed += 1,
                },
                Err(err) => {
                    warn!(campaign_id = %campaign.id, error = %err, "scheduler: dispatch failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            partially_failed = summary.partially_failed,
            failed = summary.failed,
            "scheduler: run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use textcast::domain::{
        entities::campaigns::CampaignEntity,
        repositories::campaign_dispatch::MockCampaignDispatchRepository,
    };

    use super::*;
    use crate::usecases::dispatch_campaign::{DispatchError, DispatchOutcome, MockCampaignDispatcher};

    fn claimed_campaign(id: Uuid) -> CampaignEntity {
        let now = Utc::now();
        CampaignEntity {
            id,
            user_id: Uuid::new_v4(),
            name: "Reminder".into(),
            message: "Your appointment is tomorrow".into(),
            media_url: None,
            group_id: Uuid::new_v4(),
            scheduled_for: Some(now),
            timezone: Some("America/New_York".into()),
            status: CampaignStatus::Processing.to_string(),
            processing_status: "processing".into(),
            error_message: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn outcome(campaign_id: Uuid, status: CampaignStatus) -> DispatchOutcome {
        DispatchOutcome {
            campaign_id,
            status,
            total: 2,
            accepted: 2,
            failed: 0,
        }
    }

    #[tokio::test]
    async fn nothing_due_never_invokes_dispatcher() {
        let mut repo = MockCampaignDispatchRepository::new();
        repo.expect_claim_due_campaigns()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut dispatcher = MockCampaignDispatcher::new();
        dispatcher.expect_dispatch_claimed().never();

        let usecase = ProcessScheduledCampaignsUseCase::new(Arc::new(repo), Arc::new(dispatcher));
        let summary = usecase.run(Utc::now(), None).await.unwrap();

        assert_eq!(summary, ScheduledRunSummary::default());
    }

    #[tokio::test]
    async fn one_failing_campaign_does_not_abandon_the_rest() {
        let (first, second, third) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let claimed = vec![
            claimed_campaign(first),
            claimed_campaign(second),
            claimed_campaign(third),
        ];

        let mut repo = MockCampaignDispatchRepository::new();
        repo.expect_claim_due_campaigns()
            .returning(move |_, _| Ok(claimed.clone()));

        let mut dispatcher = MockCampaignDispatcher::new();
        dispatcher
            .expect_dispatch_claimed()
            .with(eq(first))
            .returning(|id| Ok(outcome(id, CampaignStatus::Sent)));
        dispatcher
            .expect_dispatch_claimed()
            .with(eq(second))
            .returning(|_| Err(DispatchError::NoContacts));
        dispatcher
            .expect_dispatch_claimed()
            .with(eq(third))
            .returning(|id| Ok(outcome(id, CampaignStatus::PartiallyFailed)));

        let usecase = ProcessScheduledCampaignsUseCase::new(Arc::new(repo), Arc::new(dispatcher));
        let summary = usecase.run(Utc::now(), None).await.unwrap();

        assert_eq!(
            summary,
            ScheduledRunSummary {
                processed: 3,
                sent: 1,
                partially_failed: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn passes_single_campaign_filter_to_claim() {
        let campaign_id = Uuid::new_v4();

        let mut repo = MockCampaignDispatchRepository::new();
        repo.expect_claim_due_campaigns()
            .withf(move |_, only| *only == Some(campaign_id))
            .returning(|_, _| Ok(vec![]));

        let usecase = ProcessScheduledCampaignsUseCase::new(
            Arc::new(repo),
            Arc::new(MockCampaignDispatcher::new()),
        );

        assert_eq!(usecase.run(Utc::now(), Some(campaign_id)).await.unwrap().processed, 0);
    }
}
