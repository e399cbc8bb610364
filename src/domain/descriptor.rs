//! Application descriptor and template structures

use super::{split_module_id, Dependency, ModuleDefinition, ModuleType};
use crate::error::{AppError, ErrorDetail, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The resolved, versioned manifest of all modules composing one application release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
    #[serde(default)]
    pub ui_modules: Vec<ModuleDefinition>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub module_descriptors: Vec<Value>,
    #[serde(default)]
    pub ui_module_descriptors: Vec<Value>,
}

impl ApplicationDescriptor {
    /// Creates an empty descriptor; the id is `name-version`
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            id: application_id(&name, &version),
            name,
            version,
            description: None,
            modules: Vec::new(),
            ui_modules: Vec::new(),
            dependencies: Vec::new(),
            module_descriptors: Vec::new(),
            ui_module_descriptors: Vec::new(),
        }
    }

    /// Returns a copy with a new version and the id recomputed
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.version = version.into();
        next.id = application_id(&next.name, &next.version);
        next
    }

    /// Checks that the id equals `name-version`
    pub fn validate_id(&self) -> Result<(), AppError> {
        let expected = application_id(&self.name, &self.version);
        if self.id == expected {
            return Ok(());
        }
        Err(AppError::configuration(
            format!(
                "application id '{}' does not match name and version (expected '{}')",
                self.id, expected
            ),
            vec![ErrorDetail::new(ErrorKind::ConfigurationError, "malformed application id")
                .with_artifact(self.id.clone())],
        ))
    }

    /// Module definitions of the given type
    pub fn modules_of(&self, module_type: ModuleType) -> &[ModuleDefinition] {
        match module_type {
            ModuleType::Be => &self.modules,
            ModuleType::Ui => &self.ui_modules,
        }
    }

    /// Full module descriptors of the given type
    pub fn descriptors_of(&self, module_type: ModuleType) -> &[Value] {
        match module_type {
            ModuleType::Be => &self.module_descriptors,
            ModuleType::Ui => &self.ui_module_descriptors,
        }
    }

    /// Mutable access to definitions and descriptors of one type
    pub(crate) fn parts_mut(
        &mut self,
        module_type: ModuleType,
    ) -> (&mut Vec<ModuleDefinition>, &mut Vec<Value>) {
        match module_type {
            ModuleType::Be => (&mut self.modules, &mut self.module_descriptors),
            ModuleType::Ui => (&mut self.ui_modules, &mut self.ui_module_descriptors),
        }
    }

    /// Finds a module definition of the given type by name
    pub fn find_module(&self, module_type: ModuleType, name: &str) -> Option<&ModuleDefinition> {
        self.modules_of(module_type).iter().find(|m| m.name() == name)
    }
}

/// Builds an application id from name and version
pub fn application_id(name: &str, version: &str) -> String {
    format!("{}-{}", name, version)
}

/// Returns the module name of a full module descriptor (from its `id` field)
pub fn descriptor_module_name(descriptor: &Value) -> Option<String> {
    let id = descriptor.get("id")?.as_str()?;
    split_module_id(id).map(|(name, _)| name)
}

/// Declared application contents before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTemplate {
    /// Optional explicit id; must equal `name-version` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<Dependency>,
    #[serde(default)]
    pub ui_modules: Vec<Dependency>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ApplicationTemplate {
    /// Declared modules of the given type
    pub fn modules_of(&self, module_type: ModuleType) -> &[Dependency] {
        match module_type {
            ModuleType::Be => &self.modules,
            ModuleType::Ui => &self.ui_modules,
        }
    }
}
