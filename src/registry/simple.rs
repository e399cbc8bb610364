//! Flat catalog registry resolver
//!
//! `GET {url}` returns every module id the registry hosts, either as an
//! array of strings or as an array of `{ "id": ... }` objects. The catalog is
//! fetched once per registry URL and reused for later lookups.

use crate::domain::{Dependency, ModuleType};
use crate::error::RegistryError;
use crate::registry::{
    empty_on_not_found, filter_and_sort, kind_mismatch, not_found_on_404, versions_for_module,
    HttpClient, ModuleRegistry, RegistryKind, SimpleRegistry, VersionResolver,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    Id(String),
    Descriptor { id: String },
}

impl CatalogEntry {
    fn id(&self) -> &str {
        match self {
            CatalogEntry::Id(id) | CatalogEntry::Descriptor { id } => id,
        }
    }
}

/// Flat catalog registry resolver
pub struct SimpleResolver {
    client: HttpClient,
    catalogs: Mutex<HashMap<String, Arc<Vec<String>>>>,
}

impl SimpleResolver {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            catalogs: Mutex::new(HashMap::new()),
        }
    }

    fn registry<'a>(
        &self,
        registry: &'a ModuleRegistry,
    ) -> Result<&'a SimpleRegistry, RegistryError> {
        match registry {
            ModuleRegistry::Simple(r) => Ok(r),
            other => Err(kind_mismatch(RegistryKind::Simple, other)),
        }
    }

    fn cached(&self, url: &str) -> Option<Arc<Vec<String>>> {
        self.catalogs
            .lock()
            .ok()
            .and_then(|catalogs| catalogs.get(url).cloned())
    }

    /// All module ids listed by the registry
    async fn catalog(&self, url: &str) -> Result<Arc<Vec<String>>, RegistryError> {
        if let Some(ids) = self.cached(url) {
            return Ok(ids);
        }

        debug!(url, "fetching module catalog");
        let entries: Vec<CatalogEntry> = empty_on_not_found(self.client.get_json(url).await)?;
        let ids = Arc::new(
            entries
                .iter()
                .map(|entry| entry.id().to_string())
                .collect::<Vec<_>>(),
        );

        if let Ok(mut catalogs) = self.catalogs.lock() {
            catalogs.insert(url.to_string(), Arc::clone(&ids));
        }
        Ok(ids)
    }
}

#[async_trait]
impl VersionResolver for SimpleResolver {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Simple
    }

    async fn available_versions(
        &self,
        registry: &ModuleRegistry,
        dependency: &Dependency,
        _module_type: ModuleType,
    ) -> Result<Vec<String>, RegistryError> {
        let simple = self.registry(registry)?;
        let ids = self.catalog(&simple.url).await?;
        let versions = versions_for_module(ids.iter().map(String::as_str), &dependency.name);
        Ok(filter_and_sort(versions, dependency.pre_release))
    }

    async fn fetch_descriptor(
        &self,
        registry: &ModuleRegistry,
        module_id: &str,
    ) -> Result<Value, RegistryError> {
        let simple = self.registry(registry)?;
        let url = format!("{}/{}", simple.url.trim_end_matches('/'), module_id);
        not_found_on_404(self.client.get_json(&url).await, module_id, registry)
    }
}
