//! Application descriptor generation from a template

use crate::descriptor::{AssembledModule, DescriptorAssembler};
use crate::domain::{ApplicationDescriptor, ApplicationTemplate, Dependency, ModuleType};
use crate::error::{AppError, ErrorDetail, ErrorKind};
use crate::resolve::{resolution_failure, ConstraintResolver};
use crate::version::{is_prerelease, parse_version};
use tracing::info;

/// Resolves a template's modules and builds the application descriptor
pub struct DescriptorGenerator {
    resolver: ConstraintResolver,
    assembler: DescriptorAssembler,
    validate_prerelease: bool,
}

impl DescriptorGenerator {
    pub fn new(resolver: ConstraintResolver, assembler: DescriptorAssembler) -> Self {
        Self {
            resolver,
            assembler,
            validate_prerelease: false,
        }
    }

    /// Reject release applications that contain prerelease modules
    pub fn with_prerelease_validation(mut self, enabled: bool) -> Self {
        self.validate_prerelease = enabled;
        self
    }

    pub async fn generate(
        &self,
        template: &ApplicationTemplate,
    ) -> Result<ApplicationDescriptor, AppError> {
        validate_template(template)?;

        let mut resolved: Vec<(ModuleType, Vec<Dependency>)> = Vec::new();
        let mut failures = Vec::new();
        for module_type in ModuleType::all() {
            let (deps, errors) = self
                .resolver
                .resolve_collecting(template.modules_of(*module_type), *module_type)
                .await;
            resolved.push((*module_type, deps));
            failures.extend(errors);
        }
        if !failures.is_empty() {
            return Err(resolution_failure(failures));
        }

        if self.validate_prerelease {
            check_prerelease_policy(template, &resolved)?;
        }

        let mut descriptor = ApplicationDescriptor::new(&template.name, &template.version);
        descriptor.description = template.description.clone();
        descriptor.dependencies = template.dependencies.clone();

        for (module_type, deps) in &resolved {
            let (modules, errors) = self.assembler.assemble_all(deps, *module_type).await;
            failures.extend(errors);
            let (definitions, descriptors) = descriptor.parts_mut(*module_type);
            for AssembledModule {
                definition,
                descriptor: module_descriptor,
            } in modules
            {
                definitions.push(definition);
                descriptors.extend(module_descriptor);
            }
        }
        if !failures.is_empty() {
            return Err(AppError::from_details(
                format!("failed to load {} module descriptor(s)", failures.len()),
                failures,
            ));
        }

        info!(
            application = %descriptor.id,
            modules = descriptor.modules.len(),
            ui_modules = descriptor.ui_modules.len(),
            "generated application descriptor"
        );
        Ok(descriptor)
    }
}

/// Checks declarations, the explicit id and the application version
fn validate_template(template: &ApplicationTemplate) -> Result<(), AppError> {
    let mut invalid = Vec::new();
    for module_type in ModuleType::all() {
        for (index, dep) in template.modules_of(*module_type).iter().enumerate() {
            if dep.name.trim().is_empty() {
                invalid.push(ErrorDetail::new(
                    ErrorKind::ValidationFailed,
                    format!("{} module #{} has a blank name", module_type.display_name(), index + 1),
                ));
            } else if dep.version_spec.trim().is_empty() {
                invalid.push(
                    ErrorDetail::new(ErrorKind::ValidationFailed, "blank version")
                        .with_artifact(&dep.name),
                );
            }
        }
    }
    if !invalid.is_empty() {
        return Err(AppError::validation(
            format!("{} invalid module declaration(s)", invalid.len()),
            invalid,
        ));
    }

    let mut declared = ApplicationDescriptor::new(&template.name, &template.version);
    if let Some(id) = &template.id {
        declared.id = id.clone();
        declared.validate_id()?;
    }

    if parse_version(&template.version).is_none() {
        return Err(AppError::configuration(
            format!("application version '{}' is not a semantic version", template.version),
            vec![ErrorDetail::new(ErrorKind::ConfigurationError, "unparsable version")
                .with_artifact(&declared.id)],
        ));
    }
    Ok(())
}

/// A release application may only contain release modules
fn check_prerelease_policy(
    template: &ApplicationTemplate,
    resolved: &[(ModuleType, Vec<Dependency>)],
) -> Result<(), AppError> {
    if is_prerelease(&template.version) {
        return Ok(());
    }

    let offending: Vec<ErrorDetail> = resolved
        .iter()
        .flat_map(|(_, deps)| deps)
        .filter(|dep| is_prerelease(&dep.version_spec))
        .map(|dep| {
            ErrorDetail::new(
                ErrorKind::ValidationFailed,
                "prerelease module in a release application",
            )
            .with_artifact(dep.module_id())
        })
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(
            format!(
                "release application '{}' contains {} prerelease module(s)",
                template.version,
                offending.len()
            ),
            offending,
        ))
    }
}
