use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    error::{ProvideErrorMetadata, SdkError},
    operation::put_object::PutObjectError,
    primitives::ByteStream,
};
use tracing::info;

use crate::domain::repositories::storage::MediaStorageClient;

use super::s3::{S3ConnectionConfig, connect_s3};

#[derive(Debug, Clone)]
pub struct SupabaseMediaConfig {
    pub project_url: String,
    pub s3_endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub prefix: String,
}

/// MMS media bucket on Supabase Storage, written through its S3-compatible API.
/// https://supabase.com/docs/guides/storage/s3/compatibility
pub struct SupabaseMediaStorage {
    client: aws_sdk_s3::Client,
    project_url: String,
    bucket: String,
    prefix: String,
}

impl SupabaseMediaStorage {
    pub async fn new(config: SupabaseMediaConfig) -> Result<Self> {
        let client = connect_s3(&S3ConnectionConfig::new(
            config.s3_endpoint,
            config.region,
            config.access_key,
            config.secret_key,
        ))
        .await
        .context("failed to build Supabase s3 client")?;

        Ok(Self {
            client,
            project_url: config.project_url.trim_end_matches('/').to_string(),
            bucket: config.bucket,
            prefix: config.prefix.trim_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStorageClient for SupabaseMediaStorage {
    async fn upload_media(
        &self,
        object_key: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<String> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| describe_put_error(err, &self.bucket, &object_key))?;

        info!(bucket = %self.bucket, key = %object_key, size, "storage: media uploaded");
        Ok(object_key)
    }

    fn public_url(&self, object_key: &str) -> String {
        public_object_url(&self.project_url, &self.bucket, object_key)
    }

    fn key_prefix(&self) -> String {
        self.prefix.clone()
    }
}

fn public_object_url(project_url: &str, bucket: &str, object_key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        project_url.trim_end_matches('/'),
        bucket,
        object_key.trim_start_matches('/')
    )
}

fn describe_put_error(
    err: SdkError<PutObjectError>,
    bucket: &str,
    object_key: &str,
) -> anyhow::Error {
    let SdkError::ServiceError(service_err) = &err else {
        return anyhow::Error::new(err).context("failed to upload media to Supabase Storage");
    };

    let status = service_err.raw().status().as_u16();
    let code = service_err.err().code().unwrap_or("unknown");
    let mut detail = format!("failed to upload media (status {status}, code {code})");
    if let Some(message) = service_err.err().message().filter(|m| !m.is_empty()) {
        detail.push_str(&format!(": {message}"));
    }
    detail.push_str(&format!(" [bucket={bucket}, key={object_key}]"));

    anyhow::anyhow!(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_points_at_public_object_route() {
        assert_eq!(
            public_object_url("https://abc.supabase.co/", "campaign-media", "/mms/u1/a.png"),
            "https://abc.supabase.co/storage/v1/object/public/campaign-media/mms/u1/a.png"
        );
    }

    fn config_from_env() -> Result<SupabaseMediaConfig> {
        dotenvy::dotenv().ok();

        let project_url = std::env::var("SUPABASE_PROJECT_URL")?;
        Ok(SupabaseMediaConfig {
            s3_endpoint: std::env::var("SUPABASE_S3_ENDPOINT").unwrap_or_else(|_| {
                format!("{}/storage/v1/s3", project_url.trim_end_matches('/'))
            }),
            project_url,
            region: std::env::var("SUPABASE_S3_REGION")?,
            access_key: std::env::var("SUPABASE_S3_ACCESS_KEY_ID")?,
            secret_key: std::env::var("SUPABASE_S3_SECRET_ACCESS_KEY")?,
            bucket: std::env::var("SUPABASE_MEDIA_BUCKET")
                .unwrap_or_else(|_| "campaign-media".into()),
            prefix: "test".into(),
        })
    }

    #[tokio::test]
    #[ignore = "uploads to a real Supabase bucket; needs SUPABASE_* credentials"]
    async fn uploads_small_gif() -> Result<()> {
        // 1x1 transparent GIF
        let gif: Vec<u8> = vec![
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00,
            0x00, 0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c,
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00,
            0x3b,
        ];

        let storage = SupabaseMediaStorage::new(config_from_env()?).await?;
        let key = format!("{}/pixel.gif", storage.key_prefix());
        let stored = storage.upload_media(key, gif, "image/gif".into()).await?;
        println!("uploaded to {}", storage.public_url(&stored));

        Ok(())
    }
}
