use async_trait::async_trait;

use crate::error::AppError;

/// Key prefix under which document bodies are stored.
pub const DOCUMENTS_PREFIX: &str = "documents";

/// Object key of a stored document body.
pub fn document_key(filename: &str) -> String {
    format!("{DOCUMENTS_PREFIX}/{filename}")
}

/// Trait for blob storage operations (S3-compatible).
///
/// Abstracted as a trait so tests can use a mock without a real S3 instance.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Retrieve content by key. Returns `None` if the object doesn't exist.
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
}

/// S3 implementation of StorageClient.
///
/// Only available when the `server` feature is enabled.
#[cfg(feature = "server")]
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
    bucket: String,
}

#[cfg(feature = "server")]
impl S3StorageClient {
    /// Create a client from the application's S3 settings.
    ///
    /// Uses static credentials and path-style addressing, which is what
    /// self-hosted S3-compatible stores expect.
    pub async fn from_config(config: &crate::config::S3Config) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "salen-config",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build(),
        );

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl StorageClient for S3StorageClient {
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to read body: {}", e)))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to get object '{}': {}",
                        key, service_err
                    )))
                }
            }
        }
    }
}
