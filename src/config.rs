//! Configuration loading and component wiring
//!
//! A configuration file is TOML:
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//!
//! [resolution]
//! validate_artifacts = true
//!
//! [[module_registries.be.primary]]
//! type = "okapi"
//! url = "https://folio-registry.dev.folio.org"
//!
//! [[artifact_registries.be.release]]
//! type = "container"
//! namespace = "folioorg"
//! ```

use crate::artifact::{ArtifactExistenceChecker, ArtifactGate};
use crate::descriptor::{DescriptorAssembler, DescriptorGenerator};
use crate::error::{ConfigError, RegistryError};
use crate::registry::{
    ArtifactRegistries, HttpClient, ModuleRegistries, ResolverFacade, S3ObjectStore,
    BASE_DELAY_MS, DEFAULT_PAGE_SIZE, DEFAULT_REGION, DEFAULT_USER_AGENT, MAX_RETRIES,
};
use crate::resolve::ConstraintResolver;
use crate::update::{UpdateEngine, UpdateFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Resolution and generation switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// Only accept versions whose artifact is published
    pub validate_artifacts: bool,
    /// Reject prerelease modules in release applications
    pub validate_prerelease: bool,
    pub object_store_page_size: usize,
    /// Record descriptor URLs instead of fetching full descriptors
    pub descriptor_urls_only: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            validate_artifacts: false,
            validate_prerelease: false,
            object_store_page_size: DEFAULT_PAGE_SIZE,
            descriptor_urls_only: false,
        }
    }
}

/// Object store endpoint for S3-style registries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreSettings {
    /// S3-compatible endpoint (path-style); AWS addressing when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub region: String,
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpSettings,
    pub resolution: ResolutionSettings,
    pub object_store: ObjectStoreSettings,
    pub module_registries: ModuleRegistries,
    pub artifact_registries: ArtifactRegistries,
}

impl Config {
    /// Parses, fills derived registry fields and validates
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            message: e.to_string(),
        })?;
        config.prepared()
    }

    /// Reads and parses a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies generated fields and collects every invalid registry
    pub fn prepared(self) -> Result<Self, ConfigError> {
        let config = Config {
            module_registries: self.module_registries.with_generated_fields(),
            artifact_registries: self.artifact_registries.with_generated_fields(),
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = self.module_registries.validation_issues();
        issues.extend(self.artifact_registries.validation_issues());
        if self.http.timeout_secs == 0 {
            issues.push("http timeout must be positive".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidRegistries { issues })
        }
    }

    /// Wires every component from this configuration
    pub fn build(&self, cancel: CancellationToken) -> Result<Components, RegistryError> {
        let client = HttpClient::with_config(
            Duration::from_secs(self.http.timeout_secs),
            &self.http.user_agent,
        )?
        .with_max_retries(self.http.max_retries)
        .with_base_delay(Duration::from_millis(self.http.base_delay_ms))
        .with_cancellation(cancel.clone());

        let mut store = S3ObjectStore::new()
            .with_region(&self.object_store.region)
            .with_max_attempts(self.http.max_retries.saturating_add(1))
            .with_timeout(Duration::from_secs(self.http.timeout_secs));
        if let Some(endpoint) = &self.object_store.endpoint {
            store = store.with_endpoint(endpoint);
        }

        let facade = ResolverFacade::new(
            client.clone(),
            Arc::new(store),
            self.resolution.object_store_page_size,
        );

        let mut resolver = ConstraintResolver::new(facade.clone(), self.module_registries.clone())
            .with_cancellation(cancel);
        if self.resolution.validate_artifacts {
            let checker = Arc::new(ArtifactExistenceChecker::new(client));
            resolver = resolver.with_artifact_gate(ArtifactGate::new(
                checker,
                self.artifact_registries.clone(),
            ));
        }

        let assembler = DescriptorAssembler::new(facade, self.module_registries.clone())
            .urls_only(self.resolution.descriptor_urls_only);

        Ok(Components {
            resolver,
            assembler,
            validate_prerelease: self.resolution.validate_prerelease,
        })
    }
}

/// Resolution services built from a [`Config`]
#[derive(Clone)]
pub struct Components {
    pub resolver: ConstraintResolver,
    pub assembler: DescriptorAssembler,
    validate_prerelease: bool,
}

impl Components {
    pub fn generator(&self) -> DescriptorGenerator {
        DescriptorGenerator::new(self.resolver.clone(), self.assembler.clone())
            .with_prerelease_validation(self.validate_prerelease)
    }

    pub fn update_engine(&self, flags: UpdateFlags) -> UpdateEngine {
        UpdateEngine::new(self.resolver.clone(), self.assembler.clone()).with_flags(flags)
    }
}
