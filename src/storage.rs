//! S3-backed configuration source and page sink.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::{ConfigSource, Configuration, ConfigurationError};
use crate::environment::{get_env_var_or, get_optional_env_var};
use crate::publish::{PageSink, PublishError, PAGE_CONTENT_TYPE};
use crate::TARGET_STORAGE;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CONFIG_BUCKET: &str = "prtech.news.config";
pub const DEFAULT_CONFIG_KEY: &str = "config.json";
pub const DEFAULT_OUTPUT_BUCKET: &str = "prtech.news";
pub const DEFAULT_OUTPUT_KEY: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for S3Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Where the remote run reads its configuration and writes its page.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub region: String,
    /// Custom endpoint for S3-compatible stores such as R2 or MinIO.
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub config: S3Location,
    pub output: S3Location,
}

impl StorageSettings {
    pub fn from_env() -> Self {
        Self {
            region: get_env_var_or("FEEDPAGE_REGION", DEFAULT_REGION),
            endpoint_url: get_optional_env_var("FEEDPAGE_S3_ENDPOINT"),
            access_key_id: get_optional_env_var("FEEDPAGE_S3_ACCESS_KEY_ID"),
            secret_access_key: get_optional_env_var("FEEDPAGE_S3_SECRET_ACCESS_KEY"),
            config: S3Location {
                bucket: get_env_var_or("FEEDPAGE_CONFIG_BUCKET", DEFAULT_CONFIG_BUCKET),
                key: get_env_var_or("FEEDPAGE_CONFIG_KEY", DEFAULT_CONFIG_KEY),
            },
            output: S3Location {
                bucket: get_env_var_or("FEEDPAGE_OUTPUT_BUCKET", DEFAULT_OUTPUT_BUCKET),
                key: get_env_var_or("FEEDPAGE_OUTPUT_KEY", DEFAULT_OUTPUT_KEY),
            },
        }
    }
}

/// Build one S3 client for the whole run.
///
/// Explicit keys win over the default AWS credential chain, and a custom
/// endpoint switches to path-style addressing.
pub async fn create_s3_client(settings: &StorageSettings) -> Client {
    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared);

    if let (Some(access_key), Some(secret_key)) =
        (&settings.access_key_id, &settings.secret_access_key)
    {
        debug!(target: TARGET_STORAGE, "Using explicit S3 credentials");
        let creds = Credentials::new(access_key, secret_key, None, None, "feedpage");
        builder = builder.credentials_provider(creds);
    }

    if let Some(endpoint_url) = &settings.endpoint_url {
        debug!(target: TARGET_STORAGE, "Using custom S3 endpoint {}", endpoint_url);
        builder = builder.endpoint_url(endpoint_url).force_path_style(true);
    }

    Client::from_conf(builder.build())
}

/// Configuration JSON stored as an S3 object.
#[derive(Clone)]
pub struct S3ConfigSource {
    client: Client,
    location: S3Location,
}

impl S3ConfigSource {
    pub fn new(client: Client, location: S3Location) -> Self {
        Self { client, location }
    }
}

#[async_trait]
impl ConfigSource for S3ConfigSource {
    async fn load(&self) -> Result<Configuration, ConfigurationError> {
        let location = self.describe();
        let unavailable = |reason: String| ConfigurationError::Unavailable {
            location: location.clone(),
            reason,
        };

        let object = self
            .client
            .get_object()
            .bucket(&self.location.bucket)
            .key(&self.location.key)
            .send()
            .await
            .map_err(|err| unavailable(DisplayErrorContext(&err).to_string()))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|err| unavailable(err.to_string()))?
            .into_bytes();

        let config = Configuration::from_json(&bytes, &location)?;
        info!(
            target: TARGET_STORAGE,
            "Loaded configuration from {}: {} urls, {} phrases",
            location,
            config.urls.len(),
            config.phrases.len()
        );
        Ok(config)
    }

    fn describe(&self) -> String {
        self.location.to_string()
    }
}

/// Uploads the page as a `text/html` object.
#[derive(Clone)]
pub struct S3PageSink {
    client: Client,
    location: S3Location,
}

impl S3PageSink {
    pub fn new(client: Client, location: S3Location) -> Self {
        Self { client, location }
    }
}

#[async_trait]
impl PageSink for S3PageSink {
    async fn publish(&self, page: &[u8]) -> Result<String, PublishError> {
        let location = self.location.to_string();
        info!(target: TARGET_STORAGE, "Uploading {} bytes to {}", page.len(), location);

        self.client
            .put_object()
            .bucket(&self.location.bucket)
            .key(&self.location.key)
            .body(ByteStream::from(page.to_vec()))
            .content_type(PAGE_CONTENT_TYPE)
            .send()
            .await
            .map_err(|err| PublishError::Upload {
                location: location.clone(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(location)
    }
}
