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
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    axum_http::responses::{authorize_internal, error_response},
    usecases::{
        dispatch_campaign::{DispatchCampaignUseCase, DispatchError, DispatchOutcome},
        process_scheduled_campaigns::{ProcessScheduledCampaignsUseCase, ScheduledRunSummary},
    },
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/campaigns/process-scheduled" \
//     -H "Authorization: Bearer $INTERNAL_API_TOKEN"

#[derive(Clone)]
pub struct CampaignRouteState {
    pub internal_token: Option<Arc<str>>,
    pub scheduler: Arc<ProcessScheduledCampaignsUseCase>,
    pub dispatcher: Arc<DispatchCampaignUseCase>,
}

pub fn routes(state: CampaignRouteState) -> Router {
    Router::new()
        .route("/process-scheduled", post(process_scheduled))
        .route("/send", post(send_campaign))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessScheduledRequest {
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct ProcessScheduledResponse {
    success: bool,
    #[serde(flatten)]
    summary: ScheduledRunSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCampaignRequest {
    pub campaign_id: Uuid,
}

#[derive(Debug, Serialize)]
struct SendCampaignResponse {
    success: bool,
    #[serde(flatten)]
    outcome: DispatchOutcome,
}

pub async fn process_scheduled(
    State(state): State<CampaignRouteState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authorize_internal(&headers, state.internal_token.as_deref()) {
        return rejection;
    }

    // The trigger may post without a body.
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ProcessScheduledRequest::default()
    } else {
        match serde_json::from_slice::<ProcessScheduledRequest>(&body) {
            Ok(request) => request,
            Err(err) => {
                return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {err}"));
            }
        }
    };

    info!(campaign_id = ?request.campaign_id, "campaigns router: process-scheduled triggered");
    // Detached so a request timeout or client disconnect cannot strand claimed campaigns.
    let scheduler = Arc::clone(&state.scheduler);
    let run = tokio::spawn(async move { scheduler.run(Utc::now(), request.campaign_id).await });
    let result = match run.await {
        Ok(result) => result,
        Err(join_err) => Err(anyhow::Error::from(join_err)),
    };

    match result {
        Ok(summary) => Json(ProcessScheduledResponse {
            success: true,
            summary,
        })
        .into_response(),
        Err(err) => {
            error!(error = ?err, "campaigns router: process-scheduled failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to process scheduled campaigns")
        }
    }
}

pub async fn send_campaign(
    State(state): State<CampaignRouteState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authorize_internal(&headers, state.internal_token.as_deref()) {
        return rejection;
    }

    let payload = match serde_json::from_slice::<SendCampaignRequest>(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {err}"));
        }
    };
    let campaign_id = payload.campaign_id;

    let dispatcher = Arc::clone(&state.dispatcher);
    let send = tokio::spawn(async move { dispatcher.send_now(campaign_id).await });
    let result = match send.await {
        Ok(result) => result,
        Err(join_err) => Err(DispatchError::Internal(join_err.into())),
    };

    match result {
        Ok(outcome) => Json(SendCampaignResponse {
            success: true,
            outcome,
        })
        .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%campaign_id, error = ?err, "campaigns router: send failed");
            }
            error_response(status, err.to_string())
        }
    }
}
