use std::env;

use anyhow::{Context, Result};
use textcast::infra::carriers::twilio::DEFAULT_TWILIO_API_BASE_URL;

use super::config_model::{
    Analytics, Database, Dispatch, DotEnvyConfig, InternalApi, Scheduler, Twilio, WorkerServer,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: required("SERVER_PORT_WORKER")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        body_limit: parsed_or("SERVER_BODY_LIMIT", 1)?,
        timeout: parsed_or("SERVER_TIMEOUT", 60)?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let twilio = Twilio {
        account_sid: required("TWILIO_ACCOUNT_SID")?,
        auth_token: required("TWILIO_AUTH_TOKEN")?,
        from_number: required("TWILIO_FROM_NUMBER")?,
        api_base_url: optional("TWILIO_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE_URL.to_string()),
        status_callback_url: optional("TWILIO_STATUS_CALLBACK_URL"),
        validate_signatures: parsed_or("TWILIO_VALIDATE_SIGNATURES", false)?,
        webhook_base_url: optional("TWILIO_WEBHOOK_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string()),
    };

    let dispatch = Dispatch {
        max_concurrency: parsed_or::<usize>("CARRIER_MAX_CONCURRENCY", 10)?.max(1),
        sends_per_second: parsed_or::<u32>("CARRIER_SENDS_PER_SECOND", 0)
            .map(|rate| (rate > 0).then_some(rate))?,
    };

    let internal_api = InternalApi {
        token: optional("INTERNAL_API_TOKEN"),
    };

    let scheduler = Scheduler {
        loop_enabled: parsed_or("SCHEDULER_LOOP_ENABLED", false)?,
        interval_secs: parsed_or::<u64>("SCHEDULER_INTERVAL_SECS", 60)?.max(1),
    };

    let analytics = Analytics {
        reconcile_min_interval_secs: parsed_or::<i64>("ANALYTICS_RECONCILE_MIN_INTERVAL_SECS", 300)?
            .max(0),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        twilio,
        dispatch,
        internal_api,
        scheduler,
        analytics,
        stage: optional("STAGE").unwrap_or_else(|| "local".to_string()),
    })
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
