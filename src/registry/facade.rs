//! Resolver facade dispatching by registry kind

use crate::domain::{Dependency, ModuleType};
use crate::error::RegistryError;
use crate::registry::{
    HttpClient, ModuleRegistry, ObjectStore, OkapiResolver, RegistryKind, S3Resolver,
    SimpleResolver, VersionResolver,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one registry query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionLookup {
    /// Versions found, sorted descending
    Found(Vec<String>),
    /// The registry answered but has no matching entries
    Empty,
    /// The registry could not be queried
    Failed(RegistryError),
}

impl VersionLookup {
    /// The versions, treating a failure like an empty answer
    pub fn into_versions(self) -> Vec<String> {
        match self {
            VersionLookup::Found(versions) => versions,
            VersionLookup::Empty | VersionLookup::Failed(_) => Vec::new(),
        }
    }

    pub fn is_transient_failure(&self) -> bool {
        matches!(self, VersionLookup::Failed(e) if e.is_transient())
    }
}

/// Routes registry queries to the resolver for the registry's kind
#[derive(Clone)]
pub struct ResolverFacade {
    resolvers: HashMap<RegistryKind, Arc<dyn VersionResolver>>,
}

impl ResolverFacade {
    /// Builds the standard resolvers for all registry kinds
    pub fn new(client: HttpClient, object_store: Arc<dyn ObjectStore>, page_size: usize) -> Self {
        Self::with_resolvers(vec![
            Arc::new(OkapiResolver::new(client.clone())),
            Arc::new(SimpleResolver::new(client)),
            Arc::new(S3Resolver::new(object_store).with_page_size(page_size)),
        ])
    }

    /// Builds a facade from explicit resolvers; later ones replace earlier
    /// ones of the same kind.
    pub fn with_resolvers(resolvers: Vec<Arc<dyn VersionResolver>>) -> Self {
        let resolvers = resolvers
            .into_iter()
            .map(|resolver| (resolver.kind(), resolver))
            .collect();
        Self { resolvers }
    }

    fn resolver_for(&self, registry: &ModuleRegistry) -> Option<&Arc<dyn VersionResolver>> {
        let resolver = self.resolvers.get(&registry.kind());
        if resolver.is_none() {
            warn!(registry = %registry, "no resolver configured for registry kind");
        }
        resolver
    }

    /// Queries one registry for the versions of a dependency's module
    pub async fn available_versions(
        &self,
        registry: &ModuleRegistry,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> VersionLookup {
        let Some(resolver) = self.resolver_for(registry) else {
            return VersionLookup::Empty;
        };

        match resolver
            .available_versions(registry, dependency, module_type)
            .await
        {
            Ok(versions) if versions.is_empty() => {
                debug!(module = %dependency.name, registry = %registry, "no versions found");
                VersionLookup::Empty
            }
            Ok(versions) => VersionLookup::Found(versions),
            Err(e) if e.is_transient() => {
                warn!(module = %dependency.name, registry = %registry, error = %e, "registry query failed");
                VersionLookup::Failed(e)
            }
            Err(e) => {
                debug!(module = %dependency.name, registry = %registry, error = %e, "registry query failed");
                VersionLookup::Failed(e)
            }
        }
    }

    /// Fetches a module descriptor from one registry
    pub async fn fetch_descriptor(
        &self,
        registry: &ModuleRegistry,
        module_id: &str,
    ) -> Result<Value, RegistryError> {
        match self.resolver_for(registry) {
            Some(resolver) => resolver.fetch_descriptor(registry, module_id).await,
            None => Err(RegistryError::not_found(module_id, registry.location())),
        }
    }
}
