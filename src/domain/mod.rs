//! Core domain models
//!
//! This module contains the fundamental types used throughout the crate:
//! - Module types (backend / UI)
//! - Dependency declarations and prerelease policy
//! - Module definitions and the module id naming rule
//! - Application descriptors and templates
//! - Update change reports

mod dependency;
mod descriptor;
mod module_definition;
mod module_type;
mod update_report;

pub use dependency::{Dependency, PreReleaseFilter};
pub use descriptor::{
    application_id, descriptor_module_name, ApplicationDescriptor, ApplicationTemplate,
};
pub use module_definition::{module_id, split_module_id, ModuleDefinition};
pub use module_type::ModuleType;
pub use update_report::{ChangeKind, ModuleChangeEntry, ModuleChanges, UpdateReport};
