//! Application error types using thiserror
//!
//! Error hierarchy:
//! - RegistryError: Issues with module/artifact registry communication
//! - DescriptorIoError: Issues reading or writing descriptor files
//! - ConfigError: Issues loading the configuration file
//! - AppError: Batched, categorized failure reported to callers

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No candidate version satisfies a constraint, or the artifact gate rejected all of them
    ModuleNotFound,
    /// Network-level failure, or every queried registry failed transiently
    Infrastructure,
    /// Invalid registry definitions, malformed application id, bad configuration
    ConfigurationError,
    /// Disallowed downgrade, unknown module, invalid dependency declaration
    ValidationFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ModuleNotFound => "MODULE_NOT_FOUND",
            ErrorKind::Infrastructure => "INFRASTRUCTURE",
            ErrorKind::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
        };
        f.write_str(name)
    }
}

/// A single offending item inside a batched failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ErrorDetail {
    /// Creates a detail with only a kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            artifact_id: None,
            url: None,
            status: None,
            message: message.into(),
        }
    }

    /// Sets the offending artifact/module id
    pub fn with_artifact(mut self, artifact_id: impl Into<String>) -> Self {
        self.artifact_id = Some(artifact_id.into());
        self
    }

    /// Sets the URL involved in the failure
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the HTTP status involved in the failure
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds a detail from a registry error, keeping its URL and status
    pub fn from_registry_error(artifact_id: impl Into<String>, error: &RegistryError) -> Self {
        let kind = if error.is_transient() {
            ErrorKind::Infrastructure
        } else {
            ErrorKind::ModuleNotFound
        };
        let mut detail = Self::new(kind, error.to_string()).with_artifact(artifact_id);
        detail.url = error.url().map(str::to_string);
        detail.status = error.status();
        detail
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref id) = self.artifact_id {
            write!(f, "{}: ", id)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(ref url) = self.url {
            write!(f, " [{}]", url)?;
        }
        Ok(())
    }
}

/// Batched application error: one category and every offending item
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Vec<ErrorDetail>,
}

impl AppError {
    /// Creates an error without details
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Creates an error carrying the given details
    pub fn with_details(
        kind: ErrorKind,
        message: impl Into<String>,
        details: Vec<ErrorDetail>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details,
        }
    }

    /// Creates a MODULE_NOT_FOUND error
    pub fn module_not_found(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self::with_details(ErrorKind::ModuleNotFound, message, details)
    }

    /// Creates an INFRASTRUCTURE error
    pub fn infrastructure(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self::with_details(ErrorKind::Infrastructure, message, details)
    }

    /// Creates a CONFIGURATION_ERROR error
    pub fn configuration(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self::with_details(ErrorKind::ConfigurationError, message, details)
    }

    /// Creates a VALIDATION_FAILED error
    pub fn validation(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self::with_details(ErrorKind::ValidationFailed, message, details)
    }

    /// Merges per-item failures into one error.
    ///
    /// The category is INFRASTRUCTURE only when every detail is an
    /// infrastructure failure; otherwise the most specific non-infrastructure
    /// kind found first wins.
    pub fn from_details(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        let kind = details
            .iter()
            .map(|d| d.kind)
            .find(|k| *k != ErrorKind::Infrastructure)
            .unwrap_or(ErrorKind::Infrastructure);
        Self::with_details(kind, message, details)
    }

    /// Renders the message followed by a bulleted list of details
    pub fn render(&self) -> String {
        let mut out = self.message.clone();
        for detail in &self.details {
            out.push_str("\n  - ");
            out.push_str(&detail.to_string());
        }
        out
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidRegistries { issues } => {
                let details = issues
                    .into_iter()
                    .map(|issue| ErrorDetail::new(ErrorKind::ConfigurationError, issue))
                    .collect();
                AppError::configuration("invalid registry configuration", details)
            }
            other => AppError::new(ErrorKind::ConfigurationError, other.to_string()),
        }
    }
}

impl From<DescriptorIoError> for AppError {
    fn from(err: DescriptorIoError) -> Self {
        let kind = match err {
            DescriptorIoError::JsonParseError { .. } => ErrorKind::ConfigurationError,
            _ => ErrorKind::Infrastructure,
        };
        AppError::new(kind, err.to_string())
    }
}

/// Errors related to module/artifact registry communication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Module or artifact not found in registry
    #[error("'{module}' not found in {registry}")]
    NotFound { module: String, registry: String },

    /// Network request failed
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Timeout
    #[error("timeout while requesting {url}")]
    Timeout { url: String },

    /// Retryable status persisted through the whole retry budget
    #[error("{url} still returned HTTP {status} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },

    /// Non-retryable, non-success status
    #[error("unexpected HTTP {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Invalid response from registry
    #[error("invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// Object store request failure; `status` is absent when no response arrived
    #[error("object store request for bucket '{bucket}' failed: {message}")]
    ObjectStore {
        bucket: String,
        message: String,
        status: Option<u16>,
    },

    /// Operation aborted through its cancellation token
    #[error("operation cancelled")]
    Cancelled,
}

impl RegistryError {
    /// Creates a new NotFound error
    pub fn not_found(module: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::NotFound {
            module: module.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an ObjectStore error for a request that got no response
    pub fn object_store(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::ObjectStore {
            bucket: bucket.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates an ObjectStore error for a request answered with `status`
    pub fn object_store_status(
        bucket: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::ObjectStore {
            bucket: bucket.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Returns true for infrastructure failures (network, timeouts, exhausted retries)
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::Network { .. }
            | RegistryError::Timeout { .. }
            | RegistryError::RetriesExhausted { .. }
            | RegistryError::Cancelled => true,
            // The object store client retries throttling and server errors itself
            RegistryError::ObjectStore { status, .. } => {
                status.is_none_or(|status| status == 429 || status >= 500)
            }
            _ => false,
        }
    }

    /// Returns the URL involved, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            RegistryError::Network { url, .. }
            | RegistryError::Timeout { url }
            | RegistryError::RetriesExhausted { url, .. }
            | RegistryError::UnexpectedStatus { url, .. }
            | RegistryError::InvalidResponse { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Returns the HTTP status involved, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::RetriesExhausted { status, .. }
            | RegistryError::UnexpectedStatus { status, .. } => Some(*status),
            RegistryError::ObjectStore { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors related to descriptor file operations
#[derive(Error, Debug)]
pub enum DescriptorIoError {
    /// Failed to read descriptor file
    #[error("failed to read descriptor file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write descriptor file
    #[error("failed to write descriptor file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// JSON serialization error
    #[error("failed to serialize descriptor for {path}: {message}")]
    SerializeError { path: PathBuf, message: String },
}

impl DescriptorIoError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DescriptorIoError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DescriptorIoError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DescriptorIoError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse configuration: {message}")]
    TomlParseError { message: String },

    /// One or more registries failed validation
    #[error("invalid registries: {}", issues.join("; "))]
    InvalidRegistries { issues: Vec<String> },
}
