//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on 429/502/503/504 and transient network errors
//! - Cooperative cancellation through a `CancellationToken`

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("appdesc/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
pub const BASE_DELAY_MS: u64 = 100;

/// Returns true for statuses worth retrying
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
    cancel: CancellationToken,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network("", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            cancel: CancellationToken::new(),
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff delay (doubled after each retry)
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Attach a cancellation token aborting requests and backoff sleeps
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The attached cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sleeps for the backoff delay unless cancelled first
    async fn backoff(&self, delay: Duration) -> Result<(), RegistryError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RegistryError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Perform a GET request with retry logic.
    ///
    /// Any non-retryable response (including 404) is returned to the caller;
    /// only transport failures and exhausted retries are errors.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, RegistryError> {
        let mut delay = self.base_delay;
        let attempts = self.max_retries + 1;

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RegistryError::Cancelled),
                result = self.client.get(url).send() => result,
            };

            let last_error = match result {
                Ok(response) if is_retryable_status(response.status()) => {
                    let status = response.status().as_u16();
                    debug!(url, status, attempt, "retryable status");
                    RegistryError::RetriesExhausted {
                        url: url.to_string(),
                        status,
                        attempts,
                    }
                }
                Ok(response) => return Ok(response),
                Err(e) if is_transient_error(&e) => {
                    debug!(url, attempt, error = %e, "transient request failure");
                    if e.is_timeout() {
                        RegistryError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        RegistryError::network(url, e.to_string())
                    }
                }
                Err(e) => return Err(RegistryError::network(url, e.to_string())),
            };

            if attempt == attempts {
                warn!(url, attempts, error = %last_error, "giving up after retries");
                return Err(last_error);
            }

            self.backoff(delay).await?;
            delay *= 2;
        }

        Err(RegistryError::network(url, "no request attempted"))
    }

    /// Perform a GET request and require a success status
    pub async fn get_success(&self, url: &str) -> Result<reqwest::Response, RegistryError> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Perform a GET request and parse the JSON body (parse errors are not retried)
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RegistryError> {
        let response = self.get_success(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::invalid_response(url, format!("failed to parse JSON: {}", e)))
    }
}
