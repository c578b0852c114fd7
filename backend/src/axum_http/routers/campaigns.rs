use crate::{
    auth::AuthUser,
    axum_http::error_responses::usecase_error,
    usecases::campaigns::CampaignUseCase,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use std::sync::Arc;
use textcast::{
    domain::{
        repositories::{
            campaign_analytics::CampaignAnalyticsRepository, campaigns::CampaignRepository,
            contacts::ContactRepository,
        },
        value_objects::campaigns::{CreateCampaignModel, ScheduleCampaignModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            campaign_analytics::CampaignAnalyticsPostgres, campaigns::CampaignPostgres,
            contacts::ContactPostgres,
        },
    },
};
use tracing::{error, info};
use uuid::Uuid;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = CampaignUseCase::new(
        Arc::new(CampaignPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ContactPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CampaignAnalyticsPostgres::new(db_pool)),
    );

    Router::new()
        .route("/", post(create_campaign))
        .route("/:campaign_id/schedule", post(schedule_campaign))
        .route("/:campaign_id/stats", get(campaign_stats))
        .with_state(Arc::new(usecase))
}

pub async fn create_campaign<C, G, A>(
    State(usecase): State<Arc<CampaignUseCase<C, G, A>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CreateCampaignModel>,
) -> Response
where
    C: CampaignRepository + Send + Sync + 'static,
    G: ContactRepository + Send + Sync + 'static,
    A: CampaignAnalyticsRepository + Send + Sync + 'static,
{
    info!(%user_id, group_id = %model.group_id, "campaigns: create request received");
    match usecase.create_campaign(user_id, model).await {
        Ok(campaign) => (StatusCode::CREATED, Json(campaign)).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%user_id, error = ?err, "campaigns: failed to create campaign");
            }
            usecase_error(status, &err)
        }
    }
}

pub async fn schedule_campaign<C, G, A>(
    State(usecase): State<Arc<CampaignUseCase<C, G, A>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(campaign_id): Path<Uuid>,
    model: Option<Json<ScheduleCampaignModel>>,
) -> Response
where
    C: CampaignRepository + Send + Sync + 'static,
    G: ContactRepository + Send + Sync + 'static,
    A: CampaignAnalyticsRepository + Send + Sync + 'static,
{
    let model = model.map(|Json(model)| model).unwrap_or_default();
    match usecase
        .schedule_campaign(user_id, campaign_id, model, Utc::now())
        .await
    {
        Ok(campaign) => Json(campaign).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%user_id, %campaign_id, error = ?err, "campaigns: failed to schedule campaign");
            }
            usecase_error(status, &err)
        }
    }
}

pub async fn campaign_stats<C, G, A>(
    State(usecase): State<Arc<CampaignUseCase<C, G, A>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Response
where
    C: CampaignRepository + Send + Sync + 'static,
    G: ContactRepository + Send + Sync + 'static,
    A: CampaignAnalyticsRepository + Send + Sync + 'static,
{
    match usecase.campaign_stats(user_id, campaign_id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%user_id, %campaign_id, error = ?err, "campaigns: failed to load stats");
            }
            usecase_error(status, &err)
        }
    }
}
