//! Object storage client (Supabase Storage REST API)

use async_trait::async_trait;
use tracing::debug;

use super::{check_status, ClientError};
use crate::config::StorageConfig;

const SERVICE: &str = "object storage";

/// Stores a binary blob and returns the public URL it is served from
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ClientError>;
}

pub struct SupabaseStorage {
    http: reqwest::Client,
    config: StorageConfig,
}

impl SupabaseStorage {
    pub fn new(http: reqwest::Client, config: StorageConfig) -> Self {
        Self { http, config }
    }

    fn public_url(base_url: &str, bucket: &str, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            base_url.trim_end_matches('/'),
            bucket,
            filename
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ClientError> {
        let (base_url, api_key) = match (&self.config.base_url, &self.config.api_key) {
            (Some(base_url), Some(api_key)) => (base_url, api_key),
            _ => return Err(ClientError::NotConfigured { service: SERVICE }),
        };

        let url = format!(
            "{}/storage/v1/object/{}/{}",
            base_url.trim_end_matches('/'),
            self.config.bucket,
            filename
        );
        let size = bytes.len();

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header("apikey", api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::request(SERVICE, e))?;
        check_status(SERVICE, response).await?;

        debug!(bucket = %self.config.bucket, filename, size, "uploaded object");
        Ok(Self::public_url(base_url, &self.config.bucket, filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_format() {
        assert_eq!(
            SupabaseStorage::public_url("https://proj.supabase.co/", "recordings", "a.webm"),
            "https://proj.supabase.co/storage/v1/object/public/recordings/a.webm"
        );
    }

    #[tokio::test]
    async fn test_upload_without_configuration_fails() {
        let storage = SupabaseStorage::new(
            reqwest::Client::new(),
            StorageConfig {
                base_url: None,
                api_key: None,
                bucket: "recordings".into(),
            },
        );

        let err = storage
            .upload("a.webm", vec![1, 2, 3], "audio/webm")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConfigured { .. }));
    }
}
