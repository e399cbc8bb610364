//! Turns resolved dependencies into module definitions and descriptors

use crate::domain::{Dependency, ModuleDefinition, ModuleType};
use crate::error::{ErrorDetail, ErrorKind, RegistryError};
use crate::registry::{ModuleRegistries, ModuleRegistry, ResolverFacade};
use serde_json::Value;
use tracing::{debug, warn};

/// A module ready to be placed in an application descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledModule {
    pub definition: ModuleDefinition,
    /// Full module descriptor; absent in URL-only mode
    pub descriptor: Option<Value>,
}

/// Fetches module descriptors (or just their URLs) from the registries
#[derive(Clone)]
pub struct DescriptorAssembler {
    facade: ResolverFacade,
    registries: ModuleRegistries,
    urls_only: bool,
}

impl DescriptorAssembler {
    pub fn new(facade: ResolverFacade, registries: ModuleRegistries) -> Self {
        Self {
            facade,
            registries,
            urls_only: false,
        }
    }

    /// Only record download URLs instead of fetching full descriptors
    pub fn urls_only(mut self, urls_only: bool) -> Self {
        self.urls_only = urls_only;
        self
    }

    /// Builds the module entry for a resolved dependency
    pub async fn assemble(
        &self,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> Result<AssembledModule, ErrorDetail> {
        let definition = ModuleDefinition::new(&dependency.name, &dependency.version_spec);
        if self.urls_only {
            return Ok(self.url_only(definition, module_type));
        }
        self.fetch(definition, module_type).await
    }

    /// Assembles every dependency, returning successes and failures separately
    pub async fn assemble_all(
        &self,
        dependencies: &[Dependency],
        module_type: ModuleType,
    ) -> (Vec<AssembledModule>, Vec<ErrorDetail>) {
        let mut modules = Vec::with_capacity(dependencies.len());
        let mut failures = Vec::new();
        for dependency in dependencies {
            match self.assemble(dependency, module_type).await {
                Ok(module) => modules.push(module),
                Err(detail) => failures.push(detail),
            }
        }
        (modules, failures)
    }

    fn url_only(&self, definition: ModuleDefinition, module_type: ModuleType) -> AssembledModule {
        let registry = self
            .registries
            .primary(module_type)
            .first()
            .or_else(|| self.registries.fallback(module_type).first());

        let definition = match registry.and_then(|r| r.public_url(definition.id())) {
            Some(url) => definition.with_url(url),
            None => {
                warn!(module = %definition.id(), "no registry to derive a module url from");
                definition
            }
        };
        AssembledModule {
            definition,
            descriptor: None,
        }
    }

    /// First registry (primary, then fallback) that serves the descriptor wins
    async fn fetch(
        &self,
        definition: ModuleDefinition,
        module_type: ModuleType,
    ) -> Result<AssembledModule, ErrorDetail> {
        let mut errors: Vec<RegistryError> = Vec::new();
        let registries: Vec<&ModuleRegistry> = self.registries.ordered(module_type).collect();

        for registry in registries {
            match self.facade.fetch_descriptor(registry, definition.id()).await {
                Ok(descriptor) => {
                    debug!(module = %definition.id(), registry = %registry, "fetched descriptor");
                    let definition = match registry.public_url(definition.id()) {
                        Some(url) => definition.with_url(url),
                        None => definition,
                    };
                    return Ok(AssembledModule {
                        definition,
                        descriptor: Some(descriptor),
                    });
                }
                Err(e) => {
                    debug!(module = %definition.id(), registry = %registry, error = %e, "descriptor not available");
                    errors.push(e);
                }
            }
        }

        let transient = !errors.is_empty() && errors.iter().all(RegistryError::is_transient);
        match errors.last() {
            Some(last) if transient => Err(ErrorDetail::from_registry_error(definition.id(), last)),
            _ => Err(ErrorDetail::new(
                ErrorKind::ModuleNotFound,
                format!("no registry serves the {} module descriptor", module_type.display_name()),
            )
            .with_artifact(definition.id())),
        }
    }
}
