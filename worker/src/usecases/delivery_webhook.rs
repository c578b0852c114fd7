use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use textcast::domain::{
    repositories::delivery_tracking::DeliveryTrackingRepository,
    value_objects::{carrier::DeliveryStatusCallback, enums::delivery_statuses::DeliveryStatus},
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeliveryWebhookError {
    #[error("MessageStatus is required")]
    MissingStatus,
    #[error("MessageSid is required")]
    MissingSid,
    #[error("Message log not found for sid {0}")]
    UnknownSid(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DeliveryWebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeliveryWebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub campaign_id: Uuid,
    pub status: String,
    pub changed: bool,
}

pub struct DeliveryWebhookUseCase {
    repository: Arc<dyn DeliveryTrackingRepository + Send + Sync>,
}

impl DeliveryWebhookUseCase {
    pub fn new(repository: Arc<dyn DeliveryTrackingRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        callback: DeliveryStatusCallback,
    ) -> Result<DeliveryReceipt, DeliveryWebhookError> {
        let status = callback
            .message_status
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(DeliveryStatus::parse)
            .ok_or(DeliveryWebhookError::MissingStatus)?;
        let message_sid = callback
            .message_sid
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or(DeliveryWebhookError::MissingSid)?;

        let update = self
            .repository
            .apply_delivery_status(message_sid.clone(), status.clone(), callback.error_detail())
            .await?
            .ok_or_else(|| {
                warn!(%message_sid, status = %status, "delivery_webhook: unknown message sid");
                DeliveryWebhookError::UnknownSid(message_sid.clone())
            })?;

        if update.changed {
            info!(
                %message_sid,
                campaign_id = %update.campaign_id,
                from = %update.previous_status,
                to = %update.status,
                delivery_rate = ?update.counters.map(|c| c.delivery_rate()),
                "delivery_webhook: status updated"
            );
        } else {
            debug!(%message_sid, status = %update.status, "delivery_webhook: duplicate status ignored");
        }

        Ok(DeliveryReceipt {
            campaign_id: update.campaign_id,
            status: update.status.to_string(),
            changed: update.changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use textcast::domain::{
        repositories::delivery_tracking::{DeliveryStatusUpdate, MockDeliveryTrackingRepository},
        value_objects::delivery_counters::DeliveryCounters,
    };

    use super::*;

    fn callback(status: Option<&str>, sid: Option<&str>) -> DeliveryStatusCallback {
        DeliveryStatusCallback {
            message_status: status.map(str::to_string),
            message_sid: sid.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_lookup() {
        let mut repo = MockDeliveryTrackingRepository::new();
        repo.expect_apply_delivery_status().never();
        let usecase = DeliveryWebhookUseCase::new(Arc::new(repo));

        let err = usecase.handle(callback(None, Some("SM1"))).await.unwrap_err();
        assert!(matches!(err, DeliveryWebhookError::MissingStatus));

        let err = usecase.handle(callback(Some("delivered"), Some("  "))).await.unwrap_err();
        assert!(matches!(err, DeliveryWebhookError::MissingSid));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_sid_is_a_client_error() {
        let mut repo = MockDeliveryTrackingRepository::new();
        repo.expect_apply_delivery_status()
            .returning(|_, _, _| Ok(None));
        let usecase = DeliveryWebhookUseCase::new(Arc::new(repo));

        let err = usecase
            .handle(callback(Some("delivered"), Some("SMmissing")))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Message log not found for sid SMmissing");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forwards_parsed_status_and_error_detail() {
        let campaign_id = Uuid::new_v4();
        let mut repo = MockDeliveryTrackingRepository::new();
        repo.expect_apply_delivery_status()
            .with(
                eq("SM42".to_string()),
                eq(DeliveryStatus::Undelivered),
                eq(Some("30007: Carrier violation".to_string())),
            )
            .times(1)
            .returning(move |_, status, _| {
                Ok(Some(DeliveryStatusUpdate {
                    message_log_id: Uuid::new_v4(),
                    campaign_id,
                    previous_status: DeliveryStatus::Sent,
                    status,
                    changed: true,
                    counters: Some(DeliveryCounters {
                        total: 1,
                        delivered: 0,
                        failed: 1,
                        pending: 0,
                    }),
                }))
            });
        let usecase = DeliveryWebhookUseCase::new(Arc::new(repo));

        let receipt = usecase
            .handle(DeliveryStatusCallback {
                message_status: Some("Undelivered".into()),
                message_sid: Some("SM42".into()),
                error_code: Some("30007".into()),
                error_message: Some("Carrier violation".into()),
            })
            .await
            .unwrap();

        assert_eq!(
            receipt,
            DeliveryReceipt {
                campaign_id,
                status: "undelivered".into(),
                changed: true,
            }
        );
    }

    #[tokio::test]
    async fn replayed_status_reports_unchanged() {
        let campaign_id = Uuid::new_v4();
        let mut repo = MockDeliveryTrackingRepository::new();
        repo.expect_apply_delivery_status()
            .times(2)
            .returning(move |_, status, _| {
                Ok(Some(DeliveryStatusUpdate {
                    message_log_id: Uuid::new_v4(),
                    campaign_id,
                    previous_status: status.clone(),
                    status,
                    changed: false,
                    counters: None,
                }))
            });
        let usecase = DeliveryWebhookUseCase::new(Arc::new(repo));

        for _ in 0..2 {
            let receipt = usecase
                .handle(callback(Some("delivered"), Some("SM7")))
                .await
                .unwrap();
            assert!(!receipt.changed);
            assert_eq!(receipt.status, "delivered");
        }
    }
}
