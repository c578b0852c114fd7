use anyhow::Result;
use backend::axum_http::http_serve;
use backend::config::config_loader;
use std::sync::Arc;
use textcast::{
    infra::{
        db::postgres::postgres_connection,
        storages::supabase_storage::{SupabaseMediaConfig, SupabaseMediaStorage},
    },
    payments::stripe_client::StripeClient,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {:?}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    textcast::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let media = &dotenvy_env.media;
    let media_storage = SupabaseMediaStorage::new(SupabaseMediaConfig {
        project_url: dotenvy_env.supabase.project_url.clone(),
        s3_endpoint: media.s3_endpoint.clone(),
        region: media.s3_region.clone(),
        access_key: media.s3_access_key.clone(),
        secret_key: media.s3_secret_key.clone(),
        bucket: media.bucket.clone(),
        prefix: media.prefix.clone(),
    })
    .await?;

    let stripe = StripeClient::new(dotenvy_env.stripe.clone());

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(media_storage),
        Arc::new(stripe),
    )
    .await?;

    Ok(())
}
