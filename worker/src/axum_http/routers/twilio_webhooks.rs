use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, StatusCode, Uri, header::HOST},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Serialize, de::DeserializeOwned};
use textcast::{
    domain::value_objects::carrier::{DeliveryStatusCallback, InboundMessageCallback},
    infra::carriers::twilio::verify_twilio_signature,
};
use tracing::{error, warn};

use crate::{
    axum_http::responses::error_response,
    usecases::{
        delivery_webhook::DeliveryWebhookUseCase,
        opt_out::{OptOutOutcome, OptOutUseCase},
    },
};

const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Enables `X-Twilio-Signature` checks on every carrier callback.
#[derive(Clone)]
pub struct SignatureCheck {
    pub auth_token: Arc<str>,
    /// Public origin Twilio posts to; falls back to the request's Host header.
    pub public_base_url: Option<Arc<str>>,
}

#[derive(Clone)]
pub struct TwilioWebhookState {
    pub delivery: Arc<DeliveryWebhookUseCase>,
    pub opt_out: Arc<OptOutUseCase>,
    pub signature: Option<SignatureCheck>,
}

pub fn routes(state: TwilioWebhookState) -> Router {
    Router::new()
        .route("/status", post(status_callback))
        .route("/inbound", post(inbound_message))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InboundResponse {
    success: bool,
    #[serde(flatten)]
    outcome: OptOutOutcome,
}

pub async fn status_callback(
    State(state): State<TwilioWebhookState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let callback: DeliveryStatusCallback = match verified_form(&state, &uri, &headers, &body) {
        Ok(callback) => callback,
        Err(rejection) => return rejection,
    };

    match state.delivery.handle(callback).await {
        Ok(receipt) => Json(serde_json::json!({
            "success": true,
            "campaignId": receipt.campaign_id,
            "status": receipt.status,
            "changed": receipt.changed,
        }))
        .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = ?err, "twilio webhook: status callback failed");
            }
            error_response(status, err.to_string())
        }
    }
}

pub async fn inbound_message(
    State(state): State<TwilioWebhookState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let inbound: InboundMessageCallback = match verified_form(&state, &uri, &headers, &body) {
        Ok(inbound) => inbound,
        Err(rejection) => return rejection,
    };

    match state.opt_out.handle(inbound).await {
        Ok(outcome) => Json(InboundResponse {
            success: true,
            outcome,
        })
        .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = ?err, "twilio webhook: inbound handling failed");
            }
            error_response(status, err.to_string())
        }
    }
}

/// Checks the signature (when enabled) against the raw form params, then decodes the form.
fn verified_form<T: DeserializeOwned>(
    state: &TwilioWebhookState,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<T, Response> {
    if let Some(check) = &state.signature {
        let params: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|_| error_response(StatusCode::BAD_REQUEST, "invalid form body"))?;
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| error_response(StatusCode::FORBIDDEN, "missing X-Twilio-Signature"))?;

        let url = signed_url(check.public_base_url.as_deref(), headers, uri);
        if let Err(err) = verify_twilio_signature(&check.auth_token, &url, &params, provided) {
            warn!(%url, error = %err, "twilio webhook: signature rejected");
            return Err(error_response(StatusCode::FORBIDDEN, "invalid signature"));
        }
    }

    serde_urlencoded::from_bytes(body)
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, format!("invalid form body: {err}")))
}

/// Rebuilds the URL Twilio signed: public origin plus the original path and query.
fn signed_url(public_base_url: Option<&str>, headers: &HeaderMap, uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let origin = match public_base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("localhost");
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("https");
            format!("{scheme}://{host}")
        }
    };

    format!("{origin}{path_and_query}")
}
