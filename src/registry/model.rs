//! Registry model: module registries and artifact registries
//!
//! Module registries list module versions and serve module descriptors.
//! Artifact registries confirm that a built artifact (container image or npm
//! package) was actually published for a resolved version.

use crate::domain::ModuleType;
use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the module id in public URL templates
pub const MODULE_ID_PLACEHOLDER: &str = "{id}";

/// Default Docker Hub API endpoint
pub const DEFAULT_CONTAINER_REGISTRY_URL: &str = "https://hub.docker.com";

/// Default npm registry endpoint
pub const DEFAULT_PACKAGE_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Returns true if the string is an absolute http(s) URL with a host
pub fn is_well_formed_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Kind of module registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Okapi-style proxy catalog with server-side filtering
    Okapi,
    /// Flat HTTP catalog filtered client-side
    Simple,
    /// Object-storage prefix listing
    S3,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryKind::Okapi => "okapi",
            RegistryKind::Simple => "simple",
            RegistryKind::S3 => "s3",
        };
        f.write_str(name)
    }
}

/// Okapi-style module registry (`/_/proxy/modules`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkapiRegistry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url_template: Option<String>,
}

impl OkapiRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_url_template: None,
        }
    }

    /// Module listing endpoint
    pub fn modules_url(&self) -> String {
        format!("{}/_/proxy/modules", trim_trailing_slash(&self.url))
    }
}

/// Flat HTTP catalog: `GET {url}` lists every module id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleRegistry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url_template: Option<String>,
}

impl SimpleRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_url_template: None,
        }
    }
}

/// Object-storage registry: descriptors stored as `{path}{id}.json` in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Registry {
    pub bucket: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url_template: Option<String>,
}

impl S3Registry {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            public_url_template: None,
        }
    }

    /// Object key of a module descriptor
    pub fn object_key(&self, module_id: &str) -> String {
        format!("{}{}.json", self.path, module_id)
    }
}

/// A module registry of one of the supported kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleRegistry {
    Okapi(OkapiRegistry),
    Simple(SimpleRegistry),
    S3(S3Registry),
}

impl ModuleRegistry {
    /// Returns the registry kind
    pub fn kind(&self) -> RegistryKind {
        match self {
            ModuleRegistry::Okapi(_) => RegistryKind::Okapi,
            ModuleRegistry::Simple(_) => RegistryKind::Simple,
            ModuleRegistry::S3(_) => RegistryKind::S3,
        }
    }

    /// Human-readable location used in logs and error details
    pub fn location(&self) -> String {
        match self {
            ModuleRegistry::Okapi(r) => r.url.clone(),
            ModuleRegistry::Simple(r) => r.url.clone(),
            ModuleRegistry::S3(r) => format!("s3://{}/{}", r.bucket, r.path),
        }
    }

    /// Returns a description of what is wrong, if anything
    pub fn validation_issue(&self) -> Option<String> {
        match self {
            ModuleRegistry::Okapi(r) if !is_well_formed_url(&r.url) => {
                Some(format!("okapi registry has malformed url '{}'", r.url))
            }
            ModuleRegistry::Simple(r) if !is_well_formed_url(&r.url) => {
                Some(format!("simple registry has malformed url '{}'", r.url))
            }
            ModuleRegistry::S3(r) if r.bucket.trim().is_empty() || r.path.trim().is_empty() => {
                Some(format!(
                    "s3 registry needs a non-blank bucket and path (bucket='{}', path='{}')",
                    r.bucket, r.path
                ))
            }
            _ => None,
        }
    }

    /// Self-check before use
    pub fn is_valid(&self) -> bool {
        self.validation_issue().is_none()
    }

    /// Fills derived fields that are absent; explicit values are kept
    pub fn with_generated_fields(self) -> Self {
        match self {
            ModuleRegistry::Okapi(mut r) => {
                if r.public_url_template.is_none() {
                    r.public_url_template =
                        Some(format!("{}/{}", r.modules_url(), MODULE_ID_PLACEHOLDER));
                }
                ModuleRegistry::Okapi(r)
            }
            ModuleRegistry::Simple(mut r) => {
                if r.public_url_template.is_none() {
                    r.public_url_template = Some(format!(
                        "{}/{}",
                        trim_trailing_slash(&r.url),
                        MODULE_ID_PLACEHOLDER
                    ));
                }
                ModuleRegistry::Simple(r)
            }
            ModuleRegistry::S3(mut r) => {
                if !r.path.is_empty() && !r.path.ends_with('/') {
                    r.path.push('/');
                }
                if r.public_url_template.is_none() {
                    r.public_url_template = Some(format!(
                        "https://{}.s3.amazonaws.com/{}{}.json",
                        r.bucket, r.path, MODULE_ID_PLACEHOLDER
                    ));
                }
                ModuleRegistry::S3(r)
            }
        }
    }

    /// The public URL template, if known
    pub fn public_url_template(&self) -> Option<&str> {
        match self {
            ModuleRegistry::Okapi(r) => r.public_url_template.as_deref(),
            ModuleRegistry::Simple(r) => r.public_url_template.as_deref(),
            ModuleRegistry::S3(r) => r.public_url_template.as_deref(),
        }
    }

    /// Public download URL of a module descriptor
    pub fn public_url(&self, module_id: &str) -> Option<String> {
        self.public_url_template()
            .map(|template| template.replace(MODULE_ID_PLACEHOLDER, module_id))
    }
}

impl fmt::Display for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} registry {}", self.kind(), self.location())
    }
}

/// Container registry (Docker Hub API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRegistry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub namespace: String,
}

impl ContainerRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            base_url: None,
            namespace: namespace.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_REGISTRY_URL)
    }
}

/// Package registry (npm API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRegistry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub namespace: String,
}

impl PackageRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            base_url: None,
            namespace: namespace.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGE_REGISTRY_URL)
    }
}

/// An artifact registry of one of the supported kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactRegistry {
    Container(ContainerRegistry),
    Package(PackageRegistry),
}

impl ArtifactRegistry {
    pub fn base_url(&self) -> &str {
        match self {
            ArtifactRegistry::Container(r) => r.base_url(),
            ArtifactRegistry::Package(r) => r.base_url(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            ArtifactRegistry::Container(r) => &r.namespace,
            ArtifactRegistry::Package(r) => &r.namespace,
        }
    }

    /// Returns a description of what is wrong, if anything
    pub fn validation_issue(&self) -> Option<String> {
        if self.namespace().trim().is_empty() {
            return Some(format!(
                "artifact registry at '{}' needs a non-blank namespace",
                self.base_url()
            ));
        }
        if !is_well_formed_url(self.base_url()) {
            return Some(format!(
                "artifact registry has malformed base url '{}'",
                self.base_url()
            ));
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.validation_issue().is_none()
    }

    /// Fills the default base URL when absent
    pub fn with_generated_fields(self) -> Self {
        match self {
            ArtifactRegistry::Container(mut r) => {
                if r.base_url.is_none() {
                    r.base_url = Some(DEFAULT_CONTAINER_REGISTRY_URL.to_string());
                }
                ArtifactRegistry::Container(r)
            }
            ArtifactRegistry::Package(mut r) => {
                if r.base_url.is_none() {
                    r.base_url = Some(DEFAULT_PACKAGE_REGISTRY_URL.to_string());
                }
                ArtifactRegistry::Package(r)
            }
        }
    }
}

impl fmt::Display for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRegistry::Container(r) => {
                write!(f, "container registry {}/{}", r.base_url(), r.namespace)
            }
            ArtifactRegistry::Package(r) => {
                write!(f, "package registry {}/@{}", r.base_url(), r.namespace)
            }
        }
    }
}

/// Primary and fallback module registries for one module type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRegistryGroup {
    #[serde(default)]
    pub primary: Vec<ModuleRegistry>,
    #[serde(default)]
    pub fallback: Vec<ModuleRegistry>,
}

/// Module registries partitioned by module type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRegistries {
    #[serde(default)]
    pub be: ModuleRegistryGroup,
    #[serde(default)]
    pub ui: ModuleRegistryGroup,
}

impl ModuleRegistries {
    pub fn group(&self, module_type: ModuleType) -> &ModuleRegistryGroup {
        match module_type {
            ModuleType::Be => &self.be,
            ModuleType::Ui => &self.ui,
        }
    }

    pub fn primary(&self, module_type: ModuleType) -> &[ModuleRegistry] {
        &self.group(module_type).primary
    }

    pub fn fallback(&self, module_type: ModuleType) -> &[ModuleRegistry] {
        &self.group(module_type).fallback
    }

    /// Primary registries followed by fallback registries
    pub fn ordered(&self, module_type: ModuleType) -> impl Iterator<Item = &ModuleRegistry> {
        let group = self.group(module_type);
        group.primary.iter().chain(group.fallback.iter())
    }

    /// Applies `with_generated_fields` to every registry
    pub fn with_generated_fields(self) -> Self {
        let generate = |group: ModuleRegistryGroup| ModuleRegistryGroup {
            primary: group
                .primary
                .into_iter()
                .map(ModuleRegistry::with_generated_fields)
                .collect(),
            fallback: group
                .fallback
                .into_iter()
                .map(ModuleRegistry::with_generated_fields)
                .collect(),
        };
        Self {
            be: generate(self.be),
            ui: generate(self.ui),
        }
    }

    /// Collects every invalid registry instead of stopping at the first
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for module_type in ModuleType::all() {
            for registry in self.ordered(*module_type) {
                if let Some(issue) = registry.validation_issue() {
                    issues.push(format!("{} modules: {}", module_type, issue));
                }
            }
        }
        issues
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidRegistries { issues })
        }
    }
}

/// Release and prerelease artifact registries for one module type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRegistryGroup {
    #[serde(default)]
    pub release: Vec<ArtifactRegistry>,
    #[serde(default)]
    pub prerelease: Vec<ArtifactRegistry>,
}

/// Artifact registries partitioned by module type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRegistries {
    #[serde(default)]
    pub be: ArtifactRegistryGroup,
    #[serde(default)]
    pub ui: ArtifactRegistryGroup,
}

impl ArtifactRegistries {
    pub fn group(&self, module_type: ModuleType) -> &ArtifactRegistryGroup {
        match module_type {
            ModuleType::Be => &self.be,
            ModuleType::Ui => &self.ui,
        }
    }

    /// Registries to consult for a version of the given prerelease-ness
    pub fn for_version(&self, module_type: ModuleType, prerelease: bool) -> &[ArtifactRegistry] {
        let group = self.group(module_type);
        if prerelease {
            &group.prerelease
        } else {
            &group.release
        }
    }

    pub fn with_generated_fields(self) -> Self {
        let generate = |group: ArtifactRegistryGroup| ArtifactRegistryGroup {
            release: group
                .release
                .into_iter()
                .map(ArtifactRegistry::with_generated_fields)
                .collect(),
            prerelease: group
                .prerelease
                .into_iter()
                .map(ArtifactRegistry::with_generated_fields)
                .collect(),
        };
        Self {
            be: generate(self.be),
            ui: generate(self.ui),
        }
    }

    /// Collects every invalid artifact registry
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for module_type in ModuleType::all() {
            let group = self.group(*module_type);
            for registry in group.release.iter().chain(group.prerelease.iter()) {
                if let Some(issue) = registry.validation_issue() {
                    issues.push(format!("{} artifacts: {}", module_type, issue));
                }
            }
        }
        issues
    }
}
