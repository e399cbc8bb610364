//! Constraint resolution across module registries
//!
//! For every dependency that is not already pinned, every primary registry of
//! the module type is queried and all eligible versions are pooled. Fallback
//! registries are only consulted when that pool is empty. The greatest
//! version wins; with artifact validation enabled the greatest *published*
//! version wins.

mod candidates;

pub use candidates::{Candidate, CandidatePool};

use crate::artifact::ArtifactGate;
use crate::domain::{Dependency, ModuleDefinition, ModuleType};
use crate::error::{AppError, ErrorDetail, ErrorKind, RegistryError};
use crate::registry::{ModuleRegistries, ModuleRegistry, ResolverFacade};
use crate::version::{eligible_version, VersionConstraint, LATEST};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolves version constraints into exact versions
#[derive(Clone)]
pub struct ConstraintResolver {
    facade: ResolverFacade,
    registries: ModuleRegistries,
    artifact_gate: Option<ArtifactGate>,
    cancel: CancellationToken,
}

impl ConstraintResolver {
    pub fn new(facade: ResolverFacade, registries: ModuleRegistries) -> Self {
        Self {
            facade,
            registries,
            artifact_gate: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Only accept versions whose artifact is published
    pub fn with_artifact_gate(mut self, gate: ArtifactGate) -> Self {
        self.artifact_gate = Some(gate);
        self
    }

    /// Stop querying registries once the token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registries(&self) -> &ModuleRegistries {
        &self.registries
    }

    pub fn facade(&self) -> &ResolverFacade {
        &self.facade
    }

    /// Resolves one dependency to an exact version.
    ///
    /// The returned dependency keeps the original prerelease policy.
    pub async fn resolve(
        &self,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> Result<Dependency, ErrorDetail> {
        if dependency.is_exact() {
            debug!(module = %dependency.name, version = %dependency.version_spec, "already pinned");
            return Ok(dependency.clone());
        }

        let raw = if dependency.is_latest() {
            "*"
        } else {
            dependency.version_spec.as_str()
        };
        let constraint = match VersionConstraint::parse(raw) {
            Ok(constraint) => constraint,
            Err(e) => {
                warn!(module = %dependency.name, error = %e, "invalid version constraint");
                return Err(not_found(dependency, module_type));
            }
        };

        let primary = self.registries.primary(module_type);
        let mut pool = self
            .collect(primary, dependency, &constraint, module_type)
            .await?;

        let fallback = self.registries.fallback(module_type);
        if pool.is_empty() && !fallback.is_empty() {
            info!(
                module = %dependency.name,
                constraint = %dependency.version_spec,
                "no match in primary registries, trying fallback registries"
            );
            let fallback_pool = self
                .collect(fallback, dependency, &constraint, module_type)
                .await?;
            pool.absorb(fallback_pool);
        }

        if pool.is_empty() {
            if pool.all_failed_transiently() {
                return Err(ErrorDetail::new(
                    ErrorKind::Infrastructure,
                    format!(
                        "every {} registry failed while resolving '{}'",
                        module_type.display_name(),
                        dependency.version_spec
                    ),
                )
                .with_artifact(&dependency.name));
            }
            return Err(not_found(dependency, module_type));
        }

        let version = self.select(pool, dependency, module_type).await?;
        info!(module = %dependency.name, constraint = %dependency.version_spec, version = %version, "resolved");
        Ok(dependency.resolved(version))
    }

    /// Resolves every dependency, reporting all failures together
    pub async fn resolve_all(
        &self,
        dependencies: &[Dependency],
        module_type: ModuleType,
    ) -> Result<Vec<Dependency>, AppError> {
        let (resolved, failures) = self.resolve_collecting(dependencies, module_type).await;
        if failures.is_empty() {
            Ok(resolved)
        } else {
            Err(resolution_failure(failures))
        }
    }

    /// Resolves every dependency, returning successes and failures separately
    pub async fn resolve_collecting(
        &self,
        dependencies: &[Dependency],
        module_type: ModuleType,
    ) -> (Vec<Dependency>, Vec<ErrorDetail>) {
        let mut resolved = Vec::with_capacity(dependencies.len());
        let mut failures = Vec::new();
        for dependency in dependencies {
            match self.resolve(dependency, module_type).await {
                Ok(dep) => resolved.push(dep),
                Err(detail) => failures.push(detail),
            }
        }
        (resolved, failures)
    }

    /// Queries each registry in order and pools every eligible version
    async fn collect(
        &self,
        registries: &[ModuleRegistry],
        dependency: &Dependency,
        constraint: &VersionConstraint,
        module_type: ModuleType,
    ) -> Result<CandidatePool, ErrorDetail> {
        let mut pool = CandidatePool::new();
        for (registry_index, registry) in registries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ErrorDetail::from_registry_error(
                    &dependency.name,
                    &RegistryError::Cancelled,
                ));
            }

            let lookup = self
                .facade
                .available_versions(registry, dependency, module_type)
                .await;
            pool.record_query(lookup.is_transient_failure());

            for version in lookup.into_versions() {
                if let Some(parsed) = eligible_version(&version, constraint, dependency.pre_release)
                {
                    pool.push(Candidate {
                        version,
                        parsed,
                        registry_index,
                    });
                }
            }
        }
        Ok(pool)
    }

    /// Picks the greatest candidate, or the greatest published one when the
    /// artifact gate is enabled
    async fn select(
        &self,
        pool: CandidatePool,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> Result<String, ErrorDetail> {
        let candidates = pool.into_descending();
        let Some(gate) = &self.artifact_gate else {
            return candidates
                .into_iter()
                .next()
                .map(|c| c.version)
                .ok_or_else(|| not_found(dependency, module_type));
        };

        for candidate in candidates {
            let module = ModuleDefinition::new(&dependency.name, &candidate.version);
            if gate.is_published(&module, module_type).await {
                return Ok(candidate.version);
            }
            debug!(module = %module.id(), "artifact not published, trying next candidate");
        }

        Err(ErrorDetail::new(
            ErrorKind::ModuleNotFound,
            format!(
                "no published artifact for any version matching '{}'",
                dependency.version_spec
            ),
        )
        .with_artifact(&dependency.name))
    }
}

fn not_found(dependency: &Dependency, module_type: ModuleType) -> ErrorDetail {
    let constraint = if dependency.version_spec.trim().is_empty() {
        LATEST
    } else {
        dependency.version_spec.as_str()
    };
    ErrorDetail::new(
        ErrorKind::ModuleNotFound,
        format!(
            "no {} module version satisfies '{}'",
            module_type.display_name(),
            constraint
        ),
    )
    .with_artifact(&dependency.name)
}

/// Wraps per-dependency failures into one batched error
pub fn resolution_failure(failures: Vec<ErrorDetail>) -> AppError {
    AppError::from_details(
        format!("failed to resolve {} module(s)", failures.len()),
        failures,
    )
}
