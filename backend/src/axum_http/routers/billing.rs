use crate::{
    auth::AuthUser,
    axum_http::error_responses::{error_response, usecase_error},
    usecases::billing::BillingUseCase,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use textcast::{
    domain::repositories::{billing::BillingRepository, payment_gateway::PaymentGateway},
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::billing::BillingPostgres},
};
use serde_json::json;
use tracing::{error, warn};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes<G>(db_pool: Arc<PgPoolSquad>, gateway: Arc<G>) -> Router
where
    G: PaymentGateway + Send + Sync + 'static,
{
    let usecase = BillingUseCase::new(Arc::new(BillingPostgres::new(db_pool)), gateway);

    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/subscription", get(current_subscription))
        .route("/webhook", post(stripe_webhook))
        .with_state(Arc::new(usecase))
}

pub async fn create_checkout<R, G>(
    State(usecase): State<Arc<BillingUseCase<R, G>>>,
    AuthUser { user_id, email, .. }: AuthUser,
) -> Response
where
    R: BillingRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.create_checkout(user_id, email).await {
        Ok(checkout) => Json(checkout).into_response(),
        Err(err) => {
            error!(%user_id, error = ?err, "billing: failed to create checkout session");
            usecase_error(err.status_code(), &err)
        }
    }
}

pub async fn current_subscription<R, G>(
    State(usecase): State<Arc<BillingUseCase<R, G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    R: BillingRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.current_subscription(user_id).await {
        Ok(subscription) => Json(json!({ "subscription": subscription })).into_response(),
        Err(err) => {
            error!(%user_id, error = ?err, "billing: failed to load subscription");
            usecase_error(err.status_code(), &err)
        }
    }
}

/// Stripe calls this without a user token; the signature is the authentication.
pub async fn stripe_webhook<R, G>(
    State(usecase): State<Arc<BillingUseCase<R, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: BillingRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return error_response(StatusCode::BAD_REQUEST, "missing Stripe-Signature header");
    };

    match usecase.handle_webhook(&body, signature).await {
        Ok(()) => Json(json!({ "received": true })).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = ?err, "billing: webhook processing failed");
            } else {
                warn!(error = %err, "billing: webhook rejected");
            }
            usecase_error(status, &err)
        }
    }
}
