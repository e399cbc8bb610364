//! Package registry checker
//!
//! Fetches the npm package document `GET {base}/@{namespace}/{package}` and
//! looks the version up in its `versions` map.

use crate::artifact::ArtifactChecker;
use crate::domain::ModuleDefinition;
use crate::error::RegistryError;
use crate::registry::{ArtifactRegistry, HttpClient};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Prefix carried by UI module names but not by their npm packages
const UI_MODULE_PREFIX: &str = "folio_";

/// npm package document (only the parts we need)
#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

/// npm package name of a UI module: `folio_users` becomes `users`,
/// `folio_plugin_find_user` becomes `plugin-find-user`. Other names are kept.
pub fn package_name(module_name: &str) -> String {
    match module_name.strip_prefix(UI_MODULE_PREFIX) {
        Some(rest) => rest.replace('_', "-"),
        None => module_name.to_string(),
    }
}

/// npm package version checker
pub struct PackageChecker {
    client: HttpClient,
}

impl PackageChecker {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build the URL for a package document
    fn build_url(&self, registry: &ArtifactRegistry, module: &ModuleDefinition) -> String {
        format!(
            "{}/@{}/{}",
            registry.base_url().trim_end_matches('/'),
            registry.namespace(),
            package_name(module.name())
        )
    }
}

#[async_trait]
impl ArtifactChecker for PackageChecker {
    async fn exists(
        &self,
        module: &ModuleDefinition,
        registry: &ArtifactRegistry,
    ) -> Result<bool, RegistryError> {
        let url = self.build_url(registry, module);
        match self.client.get_json::<PackageDocument>(&url).await {
            Ok(document) => Ok(document.versions.contains_key(module.version())),
            Err(RegistryError::UnexpectedStatus { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
