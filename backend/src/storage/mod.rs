pub mod s3_service;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Storage call timed out")]
    Timeout,
}

/// Blob storage for uploaded leaf images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Writes `data` under `key`, replacing any previous object with the same key.
    async fn put(&self, key: &str, data: &[u8], content_type: &str)
    -> Result<(), ImageStoreError>;

    /// Public URL of `key`. Depends only on the key.
    fn public_url(&self, key: &str) -> String;
}
