use crate::{
    auth::SupabaseJwtSecret,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use textcast::{
    domain::repositories::{payment_gateway::PaymentGateway, storage::MediaStorageClient},
    infra::db::postgres::postgres_connection::PgPoolSquad,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub fn app<S, G>(
    config: &DotEnvyConfig,
    db_pool: Arc<PgPoolSquad>,
    media_storage: Arc<S>,
    payment_gateway: Arc<G>,
) -> Result<Router>
where
    S: MediaStorageClient + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let allow_origin = if config.backend_server.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins = config
            .backend_server
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/campaigns",
            routers::campaigns::routes(Arc::clone(&db_pool)),
        )
        .nest("/api/v1/media", routers::media::routes(media_storage))
        .nest(
            "/api/v1/billing",
            routers::billing::routes(db_pool, payment_gateway),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(SupabaseJwtSecret(Arc::from(
            config.supabase.jwt_secret.as_str(),
        ))))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(allow_origin),
        )
        .layer(TraceLayer::new_for_http()))
}

pub async fn start<S, G>(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    media_storage: Arc<S>,
    payment_gateway: Arc<G>,
) -> Result<()>
where
    S: MediaStorageClient + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let app = app(&config, db_pool, media_storage, payment_gateway)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
