//! Descriptor update engine
//!
//! This module provides:
//! - Update request parsing (module changes, dependency overrides)
//! - Update flags relaxing the default rules
//! - The update engine: validate, resolve, splice, bump and report
//!
//! An update never modifies the input descriptor; a new one is returned
//! together with a report of what changed.

mod flags;
mod request;

pub use flags::UpdateFlags;
pub use request::{ModuleChange, UpdateRequest};

use crate::descriptor::{AssembledModule, DescriptorAssembler};
use crate::domain::{
    descriptor_module_name, ApplicationDescriptor, ChangeKind, Dependency, ModuleDefinition,
    ModuleType, UpdateReport,
};
use crate::error::{AppError, ErrorDetail, ErrorKind};
use crate::resolve::{resolution_failure, ConstraintResolver};
use crate::version::{compare_versions, increment_patch};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// A new descriptor and what changed to get there
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub descriptor: ApplicationDescriptor,
    pub report: UpdateReport,
}

/// A module whose version will change
#[derive(Debug, Clone)]
struct PlannedChange {
    module_type: ModuleType,
    dependency: Dependency,
    previous: Option<String>,
}

impl PlannedChange {
    fn kind(&self) -> ChangeKind {
        match &self.previous {
            None => ChangeKind::Added,
            Some(previous) => match compare_versions(&self.dependency.version_spec, previous) {
                Ordering::Less => ChangeKind::Downgraded,
                _ => ChangeKind::Upgraded,
            },
        }
    }
}

/// Applies update requests to application descriptors
pub struct UpdateEngine {
    resolver: ConstraintResolver,
    assembler: DescriptorAssembler,
    flags: UpdateFlags,
}

impl UpdateEngine {
    pub fn new(resolver: ConstraintResolver, assembler: DescriptorAssembler) -> Self {
        Self {
            resolver,
            assembler,
            flags: UpdateFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: UpdateFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> UpdateFlags {
        self.flags
    }

    /// Runs an update and returns the new descriptor with its change report
    pub async fn update(
        &self,
        current: &ApplicationDescriptor,
        request: &UpdateRequest,
    ) -> Result<UpdateOutcome, AppError> {
        current.validate_id()?;

        self.check_known_modules(current, request)?;
        self.check_no_downgrade(current, request)?;

        let mut next = current.clone();
        apply_dependency_overrides(&mut next, &request.dependency_overrides);

        let planned = self.plan(current, request).await?;
        let mut report = UpdateReport::new(&current.id, &current.id);
        self.splice(&mut next, &planned, &mut report).await?;

        if self.flags.remove_unlisted_modules {
            remove_unlisted(&mut next, request, &mut report);
        }

        let next = self.next_version(next, request);
        report.application_id = next.id.clone();
        info!(
            previous = %report.previous_id,
            application = %report.application_id,
            changes = report.total_changes(),
            "descriptor updated"
        );
        Ok(UpdateOutcome {
            descriptor: next,
            report,
        })
    }

    /// Unknown modules are only accepted when adding is allowed or the
    /// requested version is `latest`
    fn check_known_modules(
        &self,
        current: &ApplicationDescriptor,
        request: &UpdateRequest,
    ) -> Result<(), AppError> {
        let mut invalid = Vec::new();
        for module_type in ModuleType::all() {
            for change in request.changes_of(*module_type) {
                if change.name.trim().is_empty() || change.version.trim().is_empty() {
                    invalid.push(
                        ErrorDetail::new(ErrorKind::ValidationFailed, "blank module name or version")
                            .with_artifact(change.to_string()),
                    );
                    continue;
                }
                let known = is_known(current, *module_type, &change.name);
                if !known && !change.is_latest() && !self.flags.allow_add_modules {
                    invalid.push(
                        ErrorDetail::new(
                            ErrorKind::ValidationFailed,
                            format!(
                                "{} module is not part of '{}'",
                                module_type.display_name(),
                                current.id
                            ),
                        )
                        .with_artifact(change.to_string()),
                    );
                }
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                format!("{} invalid module update(s)", invalid.len()),
                invalid,
            ))
        }
    }

    /// Exact versions must be strictly greater than the current ones
    fn check_no_downgrade(
        &self,
        current: &ApplicationDescriptor,
        request: &UpdateRequest,
    ) -> Result<(), AppError> {
        if self.flags.allow_downgrade {
            return Ok(());
        }

        let mut violations = Vec::new();
        for module_type in ModuleType::all() {
            for change in request.changes_of(*module_type) {
                if !change.is_exact() {
                    continue;
                }
                if let Some(existing) = current.find_module(*module_type, &change.name) {
                    if compare_versions(&change.version, existing.version()) != Ordering::Greater
                    {
                        violations.push(not_an_upgrade(existing, &change.version));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                format!("{} module(s) would not be upgraded", violations.len()),
                violations,
            ))
        }
    }

    /// Resolves every requested change into an exact version and drops the
    /// ones that leave a module unchanged
    async fn plan(
        &self,
        current: &ApplicationDescriptor,
        request: &UpdateRequest,
    ) -> Result<Vec<PlannedChange>, AppError> {
        let mut planned = Vec::new();
        let mut failures = Vec::new();
        let mut violations = Vec::new();

        for module_type in ModuleType::all() {
            for change in request.changes_of(*module_type) {
                let dependency = match self
                    .resolver
                    .resolve(&change.to_dependency(), *module_type)
                    .await
                {
                    Ok(dep) => dep,
                    Err(detail) => {
                        failures.push(detail);
                        continue;
                    }
                };

                let existing = current.find_module(*module_type, &change.name);
                if let Some(existing) = existing {
                    match compare_versions(&dependency.version_spec, existing.version()) {
                        Ordering::Equal => {
                            debug!(module = %existing.id(), "already at requested version");
                            continue;
                        }
                        Ordering::Less if !self.flags.allow_downgrade => {
                            violations.push(not_an_upgrade(existing, &dependency.version_spec));
                            continue;
                        }
                        _ => {}
                    }
                }

                planned.push(PlannedChange {
                    module_type: *module_type,
                    dependency,
                    previous: existing.map(|m| m.version().to_string()),
                });
            }
        }

        if !failures.is_empty() {
            return Err(resolution_failure(failures));
        }
        if !violations.is_empty() {
            return Err(AppError::validation(
                format!("{} module(s) would be downgraded", violations.len()),
                violations,
            ));
        }
        Ok(planned)
    }

    /// Fetches metadata for planned changes and splices it into `next`
    async fn splice(
        &self,
        next: &mut ApplicationDescriptor,
        planned: &[PlannedChange],
        report: &mut UpdateReport,
    ) -> Result<(), AppError> {
        let mut failures = Vec::new();
        for change in planned {
            let module = match self
                .assembler
                .assemble(&change.dependency, change.module_type)
                .await
            {
                Ok(module) => module,
                Err(detail) => {
                    failures.push(detail);
                    continue;
                }
            };

            report.changes_mut(change.module_type).record(
                change.kind(),
                &change.dependency.name,
                change.previous.clone(),
                Some(change.dependency.version_spec.clone()),
            );
            replace_module(next, change.module_type, module);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::from_details(
                format!("failed to load {} module descriptor(s)", failures.len()),
                failures,
            ))
        }
    }

    /// Project version, patch bump, or the current version
    fn next_version(
        &self,
        next: ApplicationDescriptor,
        request: &UpdateRequest,
    ) -> ApplicationDescriptor {
        if self.flags.use_project_version {
            if let Some(version) = &request.project_version {
                return next.with_version(version);
            }
            warn!("project version requested but none supplied");
        }
        if self.flags.no_version_bump {
            return next;
        }
        match increment_patch(&next.version) {
            Some(version) => next.with_version(version),
            None => {
                warn!(version = %next.version, "descriptor version is not semver, leaving it unchanged");
                next
            }
        }
    }
}

fn is_known(descriptor: &ApplicationDescriptor, module_type: ModuleType, name: &str) -> bool {
    descriptor.find_module(module_type, name).is_some()
        || descriptor
            .descriptors_of(module_type)
            .iter()
            .any(|d| descriptor_module_name(d).as_deref() == Some(name))
}

fn not_an_upgrade(existing: &ModuleDefinition, requested: &str) -> ErrorDetail {
    ErrorDetail::new(
        ErrorKind::ValidationFailed,
        format!(
            "requested version {} is not greater than current version {}",
            requested,
            existing.version()
        ),
    )
    .with_artifact(existing.id())
}

/// Replaces dependencies by name and appends the missing ones
fn apply_dependency_overrides(descriptor: &mut ApplicationDescriptor, overrides: &[Dependency]) {
    for dependency in overrides {
        match descriptor
            .dependencies
            .iter_mut()
            .find(|d| d.name == dependency.name)
        {
            Some(existing) => *existing = dependency.clone(),
            None => descriptor.dependencies.push(dependency.clone()),
        }
    }
}

/// Replaces the first module (and descriptor) with the same name, or appends
fn replace_module(
    descriptor: &mut ApplicationDescriptor,
    module_type: ModuleType,
    module: AssembledModule,
) {
    let (definitions, descriptors) = descriptor.parts_mut(module_type);
    let name = module.definition.name().to_string();

    match definitions.iter_mut().find(|m| m.name() == name) {
        Some(existing) => *existing = module.definition,
        None => definitions.push(module.definition),
    }

    if let Some(new_descriptor) = module.descriptor {
        match descriptors
            .iter_mut()
            .find(|d| descriptor_module_name(d).as_deref() == Some(name.as_str()))
        {
            Some(existing) => *existing = new_descriptor,
            None => descriptors.push(new_descriptor),
        }
    }
}

/// Drops modules missing from the request, per type with a non-empty request list
fn remove_unlisted(
    descriptor: &mut ApplicationDescriptor,
    request: &UpdateRequest,
    report: &mut UpdateReport,
) {
    for module_type in ModuleType::all() {
        let listed = request.changes_of(*module_type);
        if listed.is_empty() {
            continue;
        }
        let is_listed = |name: &str| listed.iter().any(|c| c.name == name);

        let (definitions, descriptors) = descriptor.parts_mut(*module_type);
        let (kept, removed): (Vec<_>, Vec<_>) = definitions
            .drain(..)
            .partition(|m| is_listed(m.name()));
        *definitions = kept;
        descriptors.retain(|d| descriptor_module_name(d).is_none_or(|name| is_listed(&name)));

        for module in removed {
            info!(module = %module.id(), "removing unlisted module");
            report.changes_mut(*module_type).record(
                ChangeKind::Removed,
                module.name(),
                Some(module.version().to_string()),
                None,
            );
        }
    }
}
