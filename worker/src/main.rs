use anyhow::Result;
use std::sync::Arc;
use textcast::domain::repositories::{
    campaign_analytics::CampaignAnalyticsRepository, campaign_dispatch::CampaignDispatchRepository,
    carrier::CarrierClient, contacts::ContactRepository,
    delivery_tracking::DeliveryTrackingRepository,
};
use textcast::infra::{
    carriers::twilio::TwilioClient,
    db::{
        postgres::postgres_connection,
        repositories::{
            campaign_analytics::CampaignAnalyticsPostgres,
            campaign_dispatch::CampaignDispatchPostgres, contacts::ContactPostgres,
            delivery_tracking::DeliveryTrackingPostgres,
        },
    },
};
use tracing::{error, info};
use worker::{
    axum_http::{
        http_serve::{self, WorkerRoutes},
        routers::{
            analytics::AnalyticsRouteState,
            campaigns::CampaignRouteState,
            twilio_webhooks::{SignatureCheck, TwilioWebhookState},
        },
    },
    config, services,
    usecases::{
        delivery_webhook::DeliveryWebhookUseCase,
        dispatch_campaign::{DispatchCampaignUseCase, DispatchSettings},
        opt_out::OptOutUseCase,
        process_scheduled_campaigns::ProcessScheduledCampaignsUseCase,
        reconcile_analytics::ReconcileAnalyticsUseCase,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:?}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    textcast::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let dispatch_repository: Arc<dyn CampaignDispatchRepository + Send + Sync> =
        Arc::new(CampaignDispatchPostgres::new(Arc::clone(&db_pool_arc)));
    let delivery_repository: Arc<dyn DeliveryTrackingRepository + Send + Sync> =
        Arc::new(DeliveryTrackingPostgres::new(Arc::clone(&db_pool_arc)));
    let contact_repository: Arc<dyn ContactRepository + Send + Sync> =
        Arc::new(ContactPostgres::new(Arc::clone(&db_pool_arc)));
    let analytics_repository: Arc<dyn CampaignAnalyticsRepository + Send + Sync> =
        Arc::new(CampaignAnalyticsPostgres::new(Arc::clone(&db_pool_arc)));

    let twilio = &dotenvy_env.twilio;
    let carrier: Arc<dyn CarrierClient + Send + Sync> = Arc::new(TwilioClient::new(
        twilio.api_base_url.clone(),
        twilio.account_sid.clone(),
        twilio.auth_token.clone(),
    ));

    let dispatcher = Arc::new(DispatchCampaignUseCase::new(
        Arc::clone(&dispatch_repository),
        carrier,
        DispatchSettings {
            from_number: twilio.from_number.clone(),
            status_callback_url: twilio.status_callback_url.clone(),
            max_concurrency: dotenvy_env.dispatch.max_concurrency,
            sends_per_second: dotenvy_env.dispatch.sends_per_second,
        },
    ));
    let scheduler = Arc::new(ProcessScheduledCampaignsUseCase::new(
        dispatch_repository,
        dispatcher.clone(),
    ));

    let internal_token: Option<Arc<str>> = dotenvy_env.internal_api.token.as_deref().map(Arc::from);
    let signature = twilio.validate_signatures.then(|| SignatureCheck {
        auth_token: Arc::from(twilio.auth_token.as_str()),
        public_base_url: twilio.webhook_base_url.as_deref().map(Arc::from),
    });
    if signature.is_none() {
        info!("twilio webhook signature validation is disabled");
    }

    let routes = WorkerRoutes {
        campaigns: CampaignRouteState {
            internal_token: internal_token.clone(),
            scheduler: Arc::clone(&scheduler),
            dispatcher,
        },
        analytics: AnalyticsRouteState {
            internal_token,
            reconcile: Arc::new(ReconcileAnalyticsUseCase::new(
                analytics_repository,
                dotenvy_env.analytics.reconcile_min_interval_secs,
            )),
        },
        twilio: TwilioWebhookState {
            delivery: Arc::new(DeliveryWebhookUseCase::new(delivery_repository)),
            opt_out: Arc::new(OptOutUseCase::new(contact_repository)),
            signature,
        },
    };

    let server_config = dotenvy_env.worker_server.clone();
    let http_server = tokio::spawn(async move { http_serve::start(server_config, routes).await });

    let scheduler_loop = if dotenvy_env.scheduler.loop_enabled {
        let interval_secs = dotenvy_env.scheduler.interval_secs;
        tokio::spawn(services::scheduler_loop::run(scheduler, interval_secs))
    } else {
        info!("scheduler loop disabled; waiting for external triggers");
        tokio::spawn(async { std::future::pending::<Result<()>>().await })
    };

    tokio::select! {
        result = http_server => result??,
        result = scheduler_loop => result??,
    };
    Ok(())
}
