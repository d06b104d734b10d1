use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use super::{ImageStore, ImageStoreError};
use crate::config::StorageSettings;

#[derive(Clone)]
pub struct S3Service {
    client: Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3Service {
    pub fn new(client: Client, bucket_name: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket_name,
            public_base_url,
        }
    }

    pub fn from_settings(
        aws_config: &aws_config::SdkConfig,
        settings: &StorageSettings,
    ) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(aws_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        log::info!(
            "S3 image store ready: bucket={} public_base_url={}",
            settings.bucket,
            settings.public_base_url
        );
        Self::new(
            client,
            settings.bucket.clone(),
            settings.public_base_url.clone(),
        )
    }
}

pub fn public_url_for(base_url: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

#[async_trait]
impl ImageStore for S3Service {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), ImageStoreError> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                log::error!("S3 put_object failed for {}: {:?}", key, e);
                ImageStoreError::S3(e.to_string())
            })?;

        log::debug!("Stored s3://{}/{}", self.bucket_name, key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_url_for(&self.public_base_url, key)
    }
}
