use std::env;

use tracing::Level;
use url::Url;

/// Identifies the process in alert messages.
#[derive(Debug, Clone)]
pub(crate) struct ServiceLabels {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AlertSettings {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) labels: ServiceLabels,
    pub(crate) alert: Option<AlertSettings>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();
        let labels = ServiceLabels {
            service_name: non_empty_env("SERVICE_NAME").unwrap_or_else(|| component.clone()),
            environment: non_empty_env("STAGE").unwrap_or_else(|| "local".to_string()),
            component,
        };

        let mut warnings = Vec::new();
        let alert = alert_settings(
            non_empty_env("ALERT_WEBHOOK_URL"),
            non_empty_env("ALERT_MIN_LEVEL"),
            &mut warnings,
        );

        Self {
            labels,
            alert,
            warnings,
        }
    }
}

fn alert_settings(
    webhook_url: Option<String>,
    min_level: Option<String>,
    warnings: &mut Vec<String>,
) -> Option<AlertSettings> {
    let webhook_url = match Url::parse(webhook_url?.trim()) {
        Ok(url) => url,
        Err(err) => {
            // The URL itself embeds a secret; only the parse error is reported.
            warnings.push(format!("ALERT_WEBHOOK_URL is invalid, alerts disabled ({err})"));
            return None;
        }
    };

    let min_level = match min_level {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!("ALERT_MIN_LEVEL `{raw}` is not a level, using error"));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    Some(AlertSettings {
        webhook_url,
        min_level,
    })
}

fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
