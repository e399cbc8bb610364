//! Okapi-style module registry resolver
//!
//! Versions are fetched with one filtered query:
//! `GET {url}/_/proxy/modules?filter={name}&orderBy=id&order=desc&{flag}={bool}`
//! where the prerelease flag is `preRelease` for backend modules and
//! `npmSnapshot` for UI modules.

use crate::domain::{Dependency, ModuleType, PreReleaseFilter};
use crate::error::RegistryError;
use crate::registry::{
    empty_on_not_found, filter_and_sort, kind_mismatch, not_found_on_404, versions_for_module,
    HttpClient, ModuleRegistry, OkapiRegistry, RegistryKind, VersionResolver,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Catalog entry returned by the module listing
#[derive(Debug, Deserialize)]
struct ModuleEntry {
    id: String,
}

/// Okapi-style registry resolver
pub struct OkapiResolver {
    client: HttpClient,
}

impl OkapiResolver {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn registry<'a>(&self, registry: &'a ModuleRegistry) -> Result<&'a OkapiRegistry, RegistryError> {
        match registry {
            ModuleRegistry::Okapi(r) => Ok(r),
            other => Err(kind_mismatch(RegistryKind::Okapi, other)),
        }
    }

    /// Build the filtered listing URL for a module
    fn build_list_url(
        &self,
        registry: &OkapiRegistry,
        module_name: &str,
        module_type: ModuleType,
        filter: Option<PreReleaseFilter>,
    ) -> Result<String, RegistryError> {
        let include_prerelease = !matches!(filter, Some(PreReleaseFilter::False));
        let base = registry.modules_url();
        let url = Url::parse_with_params(
            &base,
            &[
                ("filter", module_name),
                ("orderBy", "id"),
                ("order", "desc"),
                (
                    module_type.prerelease_query_param(),
                    if include_prerelease { "true" } else { "false" },
                ),
            ],
        )
        .map_err(|e| RegistryError::invalid_response(base.as_str(), e.to_string()))?;
        Ok(url.to_string())
    }

    fn build_descriptor_url(&self, registry: &OkapiRegistry, module_id: &str) -> String {
        format!("{}/{}", registry.modules_url(), module_id)
    }
}

#[async_trait]
impl VersionResolver for OkapiResolver {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Okapi
    }

    async fn available_versions(
        &self,
        registry: &ModuleRegistry,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> Result<Vec<String>, RegistryError> {
        let okapi = self.registry(registry)?;
        let url = self.build_list_url(okapi, &dependency.name, module_type, dependency.pre_release)?;
        debug!(url = %url, module = %dependency.name, "querying okapi registry");

        let entries: Vec<ModuleEntry> = empty_on_not_found(self.client.get_json(&url).await)?;
        let versions = versions_for_module(entries.iter().map(|e| e.id.as_str()), &dependency.name);
        Ok(filter_and_sort(versions, dependency.pre_release))
    }

    async fn fetch_descriptor(
        &self,
        registry: &ModuleRegistry,
        module_id: &str,
    ) -> Result<Value, RegistryError> {
        let okapi = self.registry(registry)?;
        let url = self.build_descriptor_url(okapi, module_id);
        not_found_on_404(self.client.get_json(&url).await, module_id, registry)
    }
}
