use super::{object_key, ObjectStorage, UploadError};
use crate::config::SpacesConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, info, instrument};

/// S3-compatible uploader (DigitalOcean Spaces, MinIO, AWS)
pub struct SpacesStorage {
    client: S3Client,
    bucket: String,
    endpoint: String,
}

impl SpacesStorage {
    /// Create a new uploader with static credentials
    pub async fn new(config: &SpacesConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "ledger-wall-config",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = S3ConfigBuilder::from(&aws_config)
            .endpoint_url(&config.endpoint)
            .force_path_style(config.force_path_style)
            .build();
        let client = S3Client::from_conf(s3_config);

        info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            "Spaces uploader initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Public URL of an object uploaded with the public-read ACL
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.endpoint, &self.bucket, key)
    }
}

fn public_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
}

#[async_trait]
impl ObjectStorage for SpacesStorage {
    #[instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    async fn store(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
    ) -> Result<String, UploadError> {
        let key = object_key(file_name);

        debug!(key = %key, "Uploading image to Spaces");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| UploadError::Request(DisplayErrorContext(e).to_string()))?;

        let url = self.public_url(&key);
        info!(key = %key, url = %url, "Image uploaded to Spaces");

        Ok(url)
    }

    fn provider(&self) -> &'static str {
        "digitalocean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SpacesConfig {
        SpacesConfig {
            endpoint: "https://sgp1.digitaloceanspaces.com/".to_string(),
            bucket: "ledger".to_string(),
            region: "sgp1".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            force_path_style: true,
        }
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        assert_eq!(
            public_url("https://sgp1.digitaloceanspaces.com/", "ledger", "a.png"),
            "https://sgp1.digitaloceanspaces.com/ledger/a.png"
        );
        assert_eq!(
            public_url("http://localhost:9000", "b", "c.jpg"),
            "http://localhost:9000/b/c.jpg"
        );
    }

    #[tokio::test]
    async fn test_uploader_builds_from_config() {
        let storage = SpacesStorage::new(&test_config()).await;
        assert_eq!(storage.provider(), "digitalocean");
        assert_eq!(
            storage.public_url("x.webp"),
            "https://sgp1.digitaloceanspaces.com/ledger/x.webp"
        );
    }
}
