use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use serde::Serialize;
use textcast::domain::{
    entities::{
        campaigns::CampaignEntity, contacts::ContactEntity, message_logs::InsertMessageLogEntity,
    },
    repositories::{
        campaign_dispatch::{CampaignDispatchRepository, CampaignWithContacts},
        carrier::CarrierClient,
    },
    value_objects::{
        carrier::{CarrierSendResult, OutboundMessage},
        enums::campaign_statuses::CampaignStatus,
    },
};
use thiserror::Error;
use tokio::{
    sync::{Mutex, Semaphore},
    time::Instant,
};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Campaign not found")]
    CampaignNotFound,
    #[error("No contacts found in the group")]
    NoContacts,
    #[error("campaign {0} is already processing or has finished")]
    NotDispatchable(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::CampaignNotFound | DispatchError::NoContacts => StatusCode::BAD_REQUEST,
            DispatchError::NotDispatchable(_) => StatusCode::CONFLICT,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub campaign_id: Uuid,
    pub status: CampaignStatus,
    pub total: usize,
    pub accepted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub from_number: String,
    pub status_callback_url: Option<String>,
    pub max_concurrency: usize,
    pub sends_per_second: Option<u32>,
}

/// Sends a campaign that has already been claimed for processing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignDispatcher {
    async fn dispatch_claimed(&self, campaign_id: Uuid) -> Result<DispatchOutcome, DispatchError>;
}

/// Hands out evenly spaced send slots shared by every campaign in flight.
struct SendPacer {
    spacing: Duration,
    next_slot: Mutex<Instant>,
}

impl SendPacer {
    fn per_second(rate: u32) -> Self {
        Self {
            spacing: Duration::from_secs(1) / rate.max(1),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    async fn wait_turn(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.spacing;
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

pub struct DispatchCampaignUseCase {
    repository: Arc<dyn CampaignDispatchRepository + Send + Sync>,
    carrier: Arc<dyn CarrierClient + Send + Sync>,
    settings: DispatchSettings,
    send_permits: Semaphore,
    pacer: Option<SendPacer>,
}

impl DispatchCampaignUseCase {
    pub fn new(
        repository: Arc<dyn CampaignDispatchRepository + Send + Sync>,
        carrier: Arc<dyn CarrierClient + Send + Sync>,
        settings: DispatchSettings,
    ) -> Self {
        let max_concurrency = settings.max_concurrency.max(1);
        Self {
            repository,
            carrier,
            send_permits: Semaphore::new(max_concurrency),
            pacer: settings.sends_per_second.map(SendPacer::per_second),
            settings: DispatchSettings {
                max_concurrency,
                ..settings
            },
        }
    }

    /// Claims a draft or scheduled campaign immediately and sends it.
    pub async fn send_now(&self, campaign_id: Uuid) -> Result<DispatchOutcome, DispatchError> {
        if self
            .repository
            .claim_campaign_for_send(campaign_id)
            .await?
            .is_none()
        {
            return match self.repository.find_campaign(campaign_id).await? {
                Some(campaign) => {
                    warn!(
                        %campaign_id,
                        status = %campaign.status,
                        processing_status = %campaign.processing_status,
                        "dispatcher: campaign is not dispatchable"
                    );
                    Err(DispatchError::NotDispatchable(campaign_id))
                }
                None => Err(DispatchError::CampaignNotFound),
            };
        }

        self.dispatch_claimed(campaign_id).await
    }

    async fn dispatch(&self, campaign_id: Uuid) -> Result<DispatchOutcome, DispatchError> {
        let CampaignWithContacts { campaign, contacts } = self
            .repository
            .find_campaign_with_contacts(campaign_id)
            .await?
            .ok_or(DispatchError::CampaignNotFound)?;

        if contacts.is_empty() {
            return Err(DispatchError::NoContacts);
        }

        let total = contacts.len();
        info!(%campaign_id, contacts = total, "dispatcher: sending campaign");

        // Every contact settles on its own; one failed send never stops the rest.
        let settled: Vec<bool> = stream::iter(contacts)
            .map(|contact| self.send_to_contact(&campaign, contact))
            .buffer_unordered(self.settings.max_concurrency)
            .collect()
            .await;
        let accepted = settled.iter().filter(|accepted| **accepted).count();

        let failed = total - accepted;
        let status = CampaignStatus::from_dispatch_outcome(accepted, failed);
        self.repository
            .mark_campaign_completed(campaign_id, status)
            .await?;

        info!(%campaign_id, total, accepted, failed, status = %status, "dispatcher: campaign completed");

        Ok(DispatchOutcome {
            campaign_id,
            status,
            total,
            accepted,
            failed,
        })
    }

    /// Returns whether the carrier accepted the message and its log row was written.
    async fn send_to_contact(&self, campaign: &CampaignEntity, contact: ContactEntity) -> bool {
        let result = match self.send_permits.acquire().await {
            Ok(_permit) => {
                if let Some(pacer) = &self.pacer {
                    pacer.wait_turn().await;
                }

                let message = OutboundMessage {
                    to: contact.phone_number.clone(),
                    from: self.settings.from_number.clone(),
                    body: campaign.message.clone(),
                    media_url: campaign.media_url.clone(),
                    status_callback: self.settings.status_callback_url.clone(),
                };

                match self.carrier.send_message(message).await {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(
                            campaign_id = %campaign.id,
                            contact_id = %contact.id,
                            error = %err,
                            "dispatcher: carrier request failed"
                        );
                        CarrierSendResult::transport_failure(format!("{err:#}"))
                    }
                }
            }
            Err(_) => CarrierSendResult::transport_failure("dispatcher is shutting down".into()),
        };

        let accepted = result.is_accepted();
        let now = Utc::now();
        let log = InsertMessageLogEntity {
            campaign_id: campaign.id,
            contact_id: Some(contact.id),
            to_number: contact.phone_number,
            message_sid: result.sid,
            status: result.status.to_string(),
            error_message: result.error_message,
            created_at: now,
            updated_at: now,
        };

        match self.repository.record_send_attempt(log).await {
            Ok(_) => accepted,
            Err(err) => {
                error!(
                    campaign_id = %campaign.id,
                    contact_id = %contact.id,
                    error = ?err,
                    "dispatcher: failed to write message log"
                );
                false
            }
        }
    }
}

#[async_trait]
impl CampaignDispatcher for DispatchCampaignUseCase {
    /// Any error marks the campaign `error` with the failure message before it is returned.
    async fn dispatch_claimed(&self, campaign_id: Uuid) -> Result<DispatchOutcome, DispatchError> {
        let err = match self.dispatch(campaign_id).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        error!(%campaign_id, error = %err, "dispatcher: campaign failed");
        if let Err(mark_err) = self
            .repository
            .mark_campaign_failed(campaign_id, err.to_string())
            .await
        {
            error!(%campaign_id, error = ?mark_err, "dispatcher: failed to record campaign failure");
            return Err(DispatchError::Internal(anyhow!(
                "{err}; additionally failed to mark campaign as error"
            )));
        }

        Err(err)
    }
}
