//! Object store transport for S3-style registries
//!
//! `S3ObjectStore` wraps the AWS SDK client. Credentials come from the
//! standard AWS provider chain (environment, shared profile, instance role);
//! the region and an optional S3-compatible endpoint come from configuration.

use crate::error::RegistryError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::Client;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub keys: Vec<String>,
    /// Present when more pages follow
    pub next_continuation_token: Option<String>,
}

/// Read-only access to a bucket-based object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists keys under a prefix, one page at a time
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectListing, RegistryError>;

    /// Reads a whole object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RegistryError>;
}

/// S3 object store backed by the AWS SDK.
///
/// The SDK client is created on first use, so configurations without S3
/// registries never touch the AWS environment.
pub struct S3ObjectStore {
    client: OnceCell<Client>,
    region: String,
    endpoint: Option<String>,
    max_attempts: u32,
    timeout: Option<Duration>,
}

impl S3ObjectStore {
    pub fn new() -> Self {
        Self {
            client: OnceCell::new(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            max_attempts: RetryConfig::standard().max_attempts(),
            timeout: None,
        }
    }

    /// Uses an already configured SDK client
    pub fn from_client(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
            ..Self::new()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Use a custom endpoint (path-style addressing), e.g. an S3-compatible server
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Total attempts per request, including the first one
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Per-operation timeout, covering every retry
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async move {
                let mut timeouts = TimeoutConfig::builder();
                if let Some(timeout) = self.timeout {
                    timeouts = timeouts.operation_timeout(timeout);
                }

                let mut loader = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(self.region.clone()))
                    .retry_config(RetryConfig::standard().with_max_attempts(self.max_attempts))
                    .timeout_config(timeouts.build());
                if let Some(endpoint) = &self.endpoint {
                    loader = loader.endpoint_url(endpoint.clone());
                }
                let shared = loader.load().await;

                let config = aws_sdk_s3::config::Builder::from(&shared)
                    .force_path_style(self.endpoint.is_some())
                    .build();
                debug!(region = %self.region, endpoint = ?self.endpoint, "object store client ready");
                Client::from_conf(config)
            })
            .await
    }
}

impl Default for S3ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an SDK failure, keeping the HTTP status when a response arrived
fn store_error<E>(bucket: &str, action: &str, error: &SdkError<E, HttpResponse>) -> RegistryError
where
    E: std::error::Error + 'static,
{
    let message = format!("{}: {}", action, DisplayErrorContext(error));
    match error.raw_response().map(|raw| raw.status().as_u16()) {
        Some(status) => RegistryError::object_store_status(bucket, status, message),
        None => RegistryError::object_store(bucket, message),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectListing, RegistryError> {
        let output = self
            .client()
            .await
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| store_error(bucket, &format!("listing '{}'", prefix), &e))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_string)
            .collect();
        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectListing {
            keys,
            next_continuation_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RegistryError> {
        let output = self
            .client()
            .await
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key())
                    || e.raw_response().is_some_and(|raw| raw.status().as_u16() == 404);
                if missing {
                    RegistryError::not_found(key, format!("s3://{}", bucket))
                } else {
                    store_error(bucket, &format!("reading '{}'", key), &e)
                }
            })?;

        let data = output.body.collect().await.map_err(|e| {
            RegistryError::object_store(bucket, format!("reading '{}': {}", key, e))
        })?;
        Ok(data.into_bytes().to_vec())
    }
}
