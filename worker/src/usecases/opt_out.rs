use std::{collections::HashSet, sync::Arc};

use axum::http::StatusCode;
use serde::Serialize;
use textcast::domain::{
    repositories::contacts::ContactRepository,
    value_objects::{carrier::InboundMessageCallback, opt_out::is_opt_out_request},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OptOutError {
    #[error("Body is required")]
    MissingBody,
    #[error("From is required")]
    MissingFrom,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OptOutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OptOutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutOutcome {
    pub opted_out: bool,
    pub removed_from_groups: usize,
}

pub struct OptOutUseCase {
    repository: Arc<dyn ContactRepository + Send + Sync>,
}

impl OptOutUseCase {
    pub fn new(repository: Arc<dyn ContactRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, inbound: InboundMessageCallback) -> Result<OptOutOutcome, OptOutError> {
        let body = inbound
            .body
            .filter(|body| !body.trim().is_empty())
            .ok_or(OptOutError::MissingBody)?;
        let from = inbound
            .from
            .map(|from| from.trim().to_string())
            .filter(|from| !from.is_empty())
            .ok_or(OptOutError::MissingFrom)?;

        if !is_opt_out_request(&body) {
            debug!("opt_out: inbound message is not an opt-out keyword");
            return Ok(OptOutOutcome {
                opted_out: false,
                removed_from_groups: 0,
            });
        }

        let group_ids = self.repository.delete_contacts_by_phone(from).await?;
        let removed_from_groups = group_ids.into_iter().collect::<HashSet<_>>().len();

        info!(removed_from_groups, "opt_out: subscriber removed from contact groups");
        Ok(OptOutOutcome {
            opted_out: true,
            removed_from_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use textcast::domain::repositories::contacts::MockContactRepository;
    use uuid::Uuid;

    use super::*;

    fn inbound(body: Option<&str>, from: Option<&str>) -> InboundMessageCallback {
        InboundMessageCallback {
            body: body.map(str::to_string),
            from: from.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn stop_removes_number_from_every_group() {
        let groups = vec![Uuid::new_v4(), Uuid::new_v4()];
        let mut repo = MockContactRepository::new();
        repo.expect_delete_contacts_by_phone()
            .with(eq("+15551234567".to_string()))
            .times(1)
            .returning(move |_| Ok(groups.clone()));

        let usecase = OptOutUseCase::new(Arc::new(repo));
        let outcome = usecase
            .handle(inbound(Some("STOP"), Some("+15551234567")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            OptOutOutcome {
                opted_out: true,
                removed_from_groups: 2,
            }
        );
    }

    #[tokio::test]
    async fn duplicate_rows_in_one_group_count_once() {
        let group = Uuid::new_v4();
        let mut repo = MockContactRepository::new();
        repo.expect_delete_contacts_by_phone()
            .returning(move |_| Ok(vec![group, group]));

        let usecase = OptOutUseCase::new(Arc::new(repo));
        let outcome = usecase
            .handle(inbound(Some(" unsubscribe! "), Some("+15551234567")))
            .await
            .unwrap();

        assert_eq!(outcome.removed_from_groups, 1);
    }

    #[tokio::test]
    async fn conversational_reply_does_not_opt_out() {
        let mut repo = MockContactRepository::new();
        repo.expect_delete_contacts_by_phone().never();

        let usecase = OptOutUseCase::new(Arc::new(repo));
        let outcome = usecase
            .handle(inbound(Some("my order was cancelled"), Some("+15551234567")))
            .await
            .unwrap();

        assert!(!outcome.opted_out);
        assert_eq!(outcome.removed_from_groups, 0);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let usecase = OptOutUseCase::new(Arc::new(MockContactRepository::new()));

        let err = usecase.handle(inbound(None, Some("+1555"))).await.unwrap_err();
        assert!(matches!(err, OptOutError::MissingBody));

        let err = usecase.handle(inbound(Some("STOP"), None)).await.unwrap_err();
        assert!(matches!(err, OptOutError::MissingFrom));
    }

    #[tokio::test]
    async fn blank_body_is_rejected_like_a_missing_one() {
        let mut repo = MockContactRepository::new();
        repo.expect_delete_contacts_by_phone().never();
        let usecase = OptOutUseCase::new(Arc::new(repo));

        for body in ["", "   ", "\n\t"] {
            let err = usecase
                .handle(inbound(Some(body), Some("+15551234567")))
                .await
                .unwrap_err();
            assert!(matches!(err, OptOutError::MissingBody));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
