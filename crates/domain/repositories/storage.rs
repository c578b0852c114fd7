use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[automock]
#[async_trait]
pub trait MediaStorageClient {
    /// Stores the object and returns its key inside the bucket.
    async fn upload_media(
        &self,
        object_key: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<String>;

    fn public_url(&self, object_key: &str) -> String;

    fn key_prefix(&self) -> String;
}
