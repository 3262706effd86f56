use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// Runtime configuration, read from the environment (and optionally a file).
///
/// Environment variable names map to fields case-insensitively, so
/// `MONGODB_URI` becomes `mongodb_uri` and `S3_BUCKET` becomes `s3_bucket`.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub mongodb_uri: String,
    #[serde(default = "default_database")]
    pub mongodb_database: String,
    /// Token clients must present to create or update posts.
    pub service_token: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Page size used when a listing request does not specify one.
    #[serde(default = "default_page_limit")]
    pub default_page_limit: i64,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
    #[serde(default = "default_region")]
    pub s3_region: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mongodb_uri", &self.redacted_mongodb_uri())
            .field("mongodb_database", &self.mongodb_database)
            .field("service_token", &"****")
            .field("bind_addr", &self.bind_addr)
            .field("default_page_limit", &self.default_page_limit)
            .field("s3", &self.s3())
            .finish()
    }
}

/// Connection settings for the S3-compatible object store.
#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .field("region", &self.region)
            .finish()
    }
}

fn default_database() -> String {
    "salen".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_page_limit() -> i64 {
    10
}

fn default_region() -> String {
    "eu-north-1".to_string()
}

impl AppConfig {
    /// Load from `config_file` (or an optional `salen.toml` in the working
    /// directory) overlaid with environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, AppError> {
        let builder = config::Config::builder();
        let builder = match config_file {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("salen").required(false)),
        };

        let settings = builder
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Self::from_settings(settings)
    }

    /// Deserialize and validate already-assembled settings.
    pub fn from_settings(settings: config::Config) -> Result<Self, AppError> {
        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if config.default_page_limit <= 0 {
            return Err(AppError::Config(format!(
                "default_page_limit must be positive, got {}",
                config.default_page_limit
            )));
        }

        Ok(config)
    }

    /// Object store settings.
    pub fn s3(&self) -> S3Config {
        S3Config {
            bucket: self.s3_bucket.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.s3_access_key_id.clone(),
            secret_access_key: self.s3_secret_access_key.clone(),
            region: self.s3_region.clone(),
        }
    }

    /// The MongoDB URI with any password replaced, safe for logs.
    pub fn redacted_mongodb_uri(&self) -> String {
        match url::Url::parse(&self.mongodb_uri) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("****"));
                parsed.to_string()
            }
            Ok(_) => self.mongodb_uri.clone(),
            Err(_) => "<unparseable mongodb uri>".to_string(),
        }
    }
}
