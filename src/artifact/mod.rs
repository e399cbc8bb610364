//! Artifact existence checks
//!
//! A resolved module version is only usable if its built artifact has been
//! published. Backend modules are shipped as container images, UI modules as
//! npm packages; each kind of artifact registry has its own checker.

mod container;
mod package;

pub use container::ContainerChecker;
pub use package::{package_name, PackageChecker};

use crate::domain::{ModuleDefinition, ModuleType};
use crate::error::RegistryError;
use crate::registry::{ArtifactRegistries, ArtifactRegistry, HttpClient};
use crate::version::is_prerelease;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Confirms that a module's artifact is published in an artifact registry
#[async_trait]
pub trait ArtifactChecker: Send + Sync {
    /// `Ok(false)` means the registry answered and the artifact is absent
    async fn exists(
        &self,
        module: &ModuleDefinition,
        registry: &ArtifactRegistry,
    ) -> Result<bool, RegistryError>;
}

/// Dispatches to the checker matching the artifact registry's kind
pub struct ArtifactExistenceChecker {
    container: ContainerChecker,
    package: PackageChecker,
}

impl ArtifactExistenceChecker {
    pub fn new(client: HttpClient) -> Self {
        Self {
            container: ContainerChecker::new(client.clone()),
            package: PackageChecker::new(client),
        }
    }
}

#[async_trait]
impl ArtifactChecker for ArtifactExistenceChecker {
    async fn exists(
        &self,
        module: &ModuleDefinition,
        registry: &ArtifactRegistry,
    ) -> Result<bool, RegistryError> {
        match registry {
            ArtifactRegistry::Container(_) => self.container.exists(module, registry).await,
            ArtifactRegistry::Package(_) => self.package.exists(module, registry).await,
        }
    }
}

/// Checks a module against every artifact registry configured for its type
/// and prerelease-ness
#[derive(Clone)]
pub struct ArtifactGate {
    checker: Arc<dyn ArtifactChecker>,
    registries: ArtifactRegistries,
}

impl ArtifactGate {
    pub fn new(checker: Arc<dyn ArtifactChecker>, registries: ArtifactRegistries) -> Self {
        Self {
            checker,
            registries,
        }
    }

    /// True if any configured registry has the artifact.
    ///
    /// A registry that cannot be queried counts as not having it.
    pub async fn is_published(&self, module: &ModuleDefinition, module_type: ModuleType) -> bool {
        let registries = self
            .registries
            .for_version(module_type, is_prerelease(module.version()));
        if registries.is_empty() {
            warn!(module = %module.id(), "no artifact registries configured");
            return false;
        }

        for registry in registries {
            match self.checker.exists(module, registry).await {
                Ok(true) => {
                    debug!(module = %module.id(), registry = %registry, "artifact found");
                    return true;
                }
                Ok(false) => {
                    debug!(module = %module.id(), registry = %registry, "artifact not found");
                }
                Err(e) => {
                    warn!(module = %module.id(), registry = %registry, error = %e, "artifact check failed");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ArtifactRegistryGroup, ContainerRegistry, PackageRegistry};
    use std::sync::Mutex;

    /// Answers from a fixed list of published module ids, recording calls
    struct Published {
        ids: Vec<&'static str>,
        fail_namespace: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactChecker for Published {
        async fn exists(
            &self,
            module: &ModuleDefinition,
            registry: &ArtifactRegistry,
        ) -> Result<bool, RegistryError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}@{}", module.id(), registry.namespace()));
            if self.fail_namespace == Some(registry.namespace()) {
                return Err(RegistryError::Timeout {
                    url: registry.base_url().to_string(),
                });
            }
            Ok(self.ids.iter().any(|id| *id == module.id()))
        }
    }

    fn registries() -> ArtifactRegistries {
        ArtifactRegistries {
            be: ArtifactRegistryGroup {
                release: vec![
                    ArtifactRegistry::Container(ContainerRegistry::new("broken")),
                    ArtifactRegistry::Container(ContainerRegistry::new("folioorg")),
                ],
                prerelease: vec![ArtifactRegistry::Container(ContainerRegistry::new(
                    "folioci",
                ))],
            },
            ui: ArtifactRegistryGroup {
                release: vec![ArtifactRegistry::Package(PackageRegistry::new("folio"))],
                prerelease: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_failure_in_one_registry_falls_through() {
        let checker = Arc::new(Published {
            ids: vec!["mod-a-1.0.0"],
            fail_namespace: Some("broken"),
            calls: Mutex::new(Vec::new()),
        });
        let gate = ArtifactGate::new(checker.clone(), registries());

        let module = ModuleDefinition::new("mod-a", "1.0.0");
        assert!(gate.is_published(&module, ModuleType::Be).await);
        assert_eq!(
            *checker.calls.lock().unwrap(),
            vec!["mod-a-1.0.0@broken", "mod-a-1.0.0@folioorg"]
        );
    }

    #[tokio::test]
    async fn test_prerelease_uses_prerelease_registries() {
        let checker = Arc::new(Published {
            ids: vec!["mod-a-1.1.0-SNAPSHOT.3"],
            fail_namespace: None,
            calls: Mutex::new(Vec::new()),
        });
        let gate = ArtifactGate::new(checker.clone(), registries());

        let module = ModuleDefinition::new("mod-a", "1.1.0-SNAPSHOT.3");
        assert!(gate.is_published(&module, ModuleType::Be).await);
        assert_eq!(
            *checker.calls.lock().unwrap(),
            vec!["mod-a-1.1.0-SNAPSHOT.3@folioci"]
        );
    }

    #[tokio::test]
    async fn test_no_registries_means_unpublished() {
        let checker = Arc::new(Published {
            ids: vec!["folio_users-8.0.0-SNAPSHOT.1"],
            fail_namespace: None,
            calls: Mutex::new(Vec::new()),
        });
        let gate = ArtifactGate::new(checker.clone(), registries());

        let module = ModuleDefinition::new("folio_users", "8.0.0-SNAPSHOT.1");
        assert!(!gate.is_published(&module, ModuleType::Ui).await);
        assert!(checker.calls.lock().unwrap().is_empty());
    }
}
