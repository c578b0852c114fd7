mod config;
mod layer;
mod notifier;
mod webhook;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use config::ObservabilityConfig;
use layer::AlertLayer;
use notifier::AlertDispatcher;
use webhook::ChatWebhookSink;

/// Installs the global tracing subscriber for a binary. Must be called from inside a Tokio
/// runtime when `ALERT_WEBHOOK_URL` is set, since alert delivery runs on a spawned task.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alert.as_ref() {
        Some(alert) => {
            let sink = ChatWebhookSink::new(alert.webhook_url.clone())?;
            let dispatcher = AlertDispatcher::spawn(vec![Arc::new(sink)]);
            Some(
                AlertLayer::new(dispatcher, config.labels.clone())
                    .with_filter(LevelFilter::from_level(alert.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so container TZ shows up in the offset.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.labels.service_name,
            component = %config.labels.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %config.labels.service_name,
        environment = %config.labels.environment,
        component = %config.labels.component,
        alerts_enabled = config.alert.is_some(),
        "observability: tracing initialized"
    );

    Ok(())
}
