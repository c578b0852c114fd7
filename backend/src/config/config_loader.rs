use anyhow::{Context, Result};
use textcast::payments::stripe_client::StripeSettings;

use super::config_model::{BackendServer, Database, DotEnvyConfig, Media, Supabase};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT")?
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: parsed_or("SERVER_BODY_LIMIT", 10)?,
        timeout: parsed_or("SERVER_TIMEOUT", 30)?,
        allowed_origins: optional("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let supabase = Supabase {
        project_url: required("SUPABASE_PROJECT_URL")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let media = Media {
        s3_endpoint: required("SUPABASE_S3_ENDPOINT")?,
        s3_region: optional("SUPABASE_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        s3_access_key: required("SUPABASE_S3_ACCESS_KEY")?,
        s3_secret_key: required("SUPABASE_S3_SECRET_KEY")?,
        bucket: optional("SUPABASE_MEDIA_BUCKET").unwrap_or_else(|| "campaign-media".to_string()),
        prefix: optional("SUPABASE_MEDIA_PREFIX").unwrap_or_else(|| "mms".to_string()),
    };

    let stripe = StripeSettings {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        price_id: required("STRIPE_PRICE_ID")?,
        success_url: required("STRIPE_SUCCESS_URL")?,
        cancel_url: required("STRIPE_CANCEL_URL")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        media,
        stripe,
    })
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
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
