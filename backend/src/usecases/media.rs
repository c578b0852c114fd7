use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use textcast::domain::repositories::storage::MediaStorageClient;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file is empty")]
    Empty,
    #[error("unsupported media type {0}; use image/jpeg, image/png or image/gif")]
    UnsupportedType(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MediaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MediaError::Empty | MediaError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            MediaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    pub url: String,
    pub path: String,
}

/// MMS-safe image types and the extension stored for each.
fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub struct MediaUseCase<S>
where
    S: MediaStorageClient + Send + Sync + 'static,
{
    storage: Arc<S>,
}

impl<S> MediaUseCase<S>
where
    S: MediaStorageClient + Send + Sync + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn upload_image(
        &self,
        user_id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedMedia, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let extension = image_extension(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;
        let content_type = match extension {
            "jpg" => "image/jpeg",
            "png" => "image/png",
            _ => "image/gif",
        };

        let prefix = self.storage.key_prefix();
        let prefix = prefix.trim_matches('/');
        let file_name = format!("{}/{}.{}", user_id, Uuid::new_v4(), extension);
        let object_key = if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        };

        let size = bytes.len();
        let path = self
            .storage
            .upload_media(object_key, bytes, content_type.to_string())
            .await?;
        info!(%user_id, %path, size, "media: uploaded");

        Ok(UploadedMedia {
            url: self.storage.public_url(&path),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textcast::domain::repositories::storage::MockMediaStorageClient;

    #[test]
    fn maps_mms_image_types() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(image_extension("image/gif"), Some("gif"));
        assert_eq!(image_extension("image/webp"), None);
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[tokio::test]
    async fn stores_under_prefix_and_user() {
        let user_id = Uuid::new_v4();
        let mut storage = MockMediaStorageClient::new();
        storage
            .expect_key_prefix()
            .returning(|| "campaign-media/".to_string());
        storage
            .expect_upload_media()
            .withf(move |key, bytes, content_type| {
                key.starts_with(&format!("campaign-media/{user_id}/"))
                    && key.ends_with(".png")
                    && bytes.len() == 3
                    && content_type == "image/png"
            })
            .returning(|key, _, _| Ok(key));
        storage
            .expect_public_url()
            .returning(|key| format!("https://cdn.test/{key}"));

        let uploaded = MediaUseCase::new(Arc::new(storage))
            .upload_image(user_id, "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(uploaded.url, format!("https://cdn.test/{}", uploaded.path));
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let mut storage = MockMediaStorageClient::new();
        storage.expect_upload_media().never();

        let err = MediaUseCase::new(Arc::new(storage))
            .upload_image(Uuid::new_v4(), "video/mp4", vec![0; 16])
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::UnsupportedType(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_empty_body() {
        let err = MediaUseCase::new(Arc::new(MockMediaStorageClient::new()))
            .upload_image(Uuid::new_v4(), "image/jpeg", Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Empty));
    }
}
