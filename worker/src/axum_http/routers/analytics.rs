use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    axum_http::responses::{authorize_internal, error_response},
    usecases::reconcile_analytics::{ReconcileAnalyticsUseCase, ReconcileOutcome},
};

#[derive(Clone)]
pub struct AnalyticsRouteState {
    pub internal_token: Option<Arc<str>>,
    pub reconcile: Arc<ReconcileAnalyticsUseCase>,
}

pub fn routes(state: AnalyticsRouteState) -> Router {
    Router::new()
        .route("/reconcile", post(reconcile))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub campaign_id: Uuid,
}

pub async fn reconcile(
    State(state): State<AnalyticsRouteState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authorize_internal(&headers, state.internal_token.as_deref()) {
        return rejection;
    }

    let payload = match serde_json::from_slice::<ReconcileRequest>(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {err}"));
        }
    };

    match state.reconcile.run(payload.campaign_id, Utc::now()).await {
        Ok(ReconcileOutcome::Skipped { last_reconciled_at }) => Json(json!({
            "success": true,
            "skipped": true,
            "lastReconciledAt": last_reconciled_at,
        }))
        .into_response(),
        Ok(ReconcileOutcome::Reconciled(summary)) => Json(json!({
            "success": true,
            "skipped": false,
            "stats": summary,
        }))
        .into_response(),
        Err(err) => {
            error!(campaign_id = %payload.campaign_id, error = ?err, "analytics router: reconcile failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to reconcile analytics")
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header::AUTHORIZATION},
    };
    use textcast::domain::repositories::campaign_analytics::MockCampaignAnalyticsRepository;
    use tower::ServiceExt;

    use super::*;

    fn router(repository: MockCampaignAnalyticsRepository) -> Router {
        routes(AnalyticsRouteState {
            internal_token: Some(Arc::from("s3cret")),
            reconcile: Arc::new(ReconcileAnalyticsUseCase::new(Arc::new(repository), 300)),
        })
    }

    fn reconcile_request(authorization: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/reconcile");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn rejects_unauthenticated_request_before_parsing() {
        let mut repo = MockCampaignAnalyticsRepository::new();
        repo.expect_reconcile_counters().never();

        let response = router(repo)
            .oneshot(reconcile_request(Some("Bearer wrong"), "{"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let mut repo = MockCampaignAnalyticsRepository::new();
        repo.expect_reconcile_counters().never();

        let response = router(repo)
            .oneshot(reconcile_request(Some("Bearer s3cret"), r#"{"campaignId":"nope"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
