//! Update requests: which modules should move to which versions

use crate::domain::{split_module_id, Dependency, ModuleType, PreReleaseFilter};
use crate::version::{is_exact_version, LATEST};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested module version change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleChange {
    pub name: String,
    /// Exact version, range, or `latest`
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_release: Option<PreReleaseFilter>,
}

impl ModuleChange {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            pre_release: None,
        }
    }

    pub fn with_pre_release(mut self, filter: PreReleaseFilter) -> Self {
        self.pre_release = Some(filter);
        self
    }

    /// Parses `mod-a-1.2.0`, `mod-a:latest` or `mod-a:^1.2`
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if let Some((name, version)) = spec.rsplit_once(':') {
            let (name, version) = (name.trim(), version.trim());
            if name.is_empty() || version.is_empty() {
                return None;
            }
            return Some(Self::new(name, version));
        }
        let (name, version) = split_module_id(spec)?;
        Some(Self::new(name, version))
    }

    pub fn is_latest(&self) -> bool {
        self.version.trim().eq_ignore_ascii_case(LATEST)
    }

    pub fn is_exact(&self) -> bool {
        is_exact_version(&self.version)
    }

    /// The change as a dependency to resolve
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            name: self.name.clone(),
            version_spec: self.version.clone(),
            pre_release: self.pre_release,
        }
    }
}

impl fmt::Display for ModuleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "{}-{}", self.name, self.version)
        } else {
            write!(f, "{}:{}", self.name, self.version)
        }
    }
}

/// Everything an update should change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub modules: Vec<ModuleChange>,
    #[serde(default)]
    pub ui_modules: Vec<ModuleChange>,
    /// Application dependencies replacing (or extending) the declared ones
    #[serde(default)]
    pub dependency_overrides: Vec<Dependency>,
    /// Version used when `use_project_version` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_version: Option<String>,
}

impl UpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested changes of one module type
    pub fn changes_of(&self, module_type: ModuleType) -> &[ModuleChange] {
        match module_type {
            ModuleType::Be => &self.modules,
            ModuleType::Ui => &self.ui_modules,
        }
    }

    pub fn with_change(mut self, module_type: ModuleType, change: ModuleChange) -> Self {
        match module_type {
            ModuleType::Be => self.modules.push(change),
            ModuleType::Ui => self.ui_modules.push(change),
        }
        self
    }

    pub fn with_project_version(mut self, version: impl Into<String>) -> Self {
        self.project_version = Some(version.into());
        self
    }

    pub fn with_dependency_override(mut self, dependency: Dependency) -> Self {
        self.dependency_overrides.push(dependency);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.ui_modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        let change = ModuleChange::parse("mod-users-bl-7.10.0").unwrap();
        assert_eq!(change.name, "mod-users-bl");
        assert_eq!(change.version, "7.10.0");
        assert!(change.is_exact());
        assert_eq!(change.to_string(), "mod-users-bl-7.10.0");
    }

    #[test]
    fn test_parse_latest_and_range() {
        let latest = ModuleChange::parse("mod-a:latest").unwrap();
        assert_eq!(latest.name, "mod-a");
        assert!(latest.is_latest());
        assert_eq!(latest.to_string(), "mod-a:latest");

        let range = ModuleChange::parse(" folio_users:^8.1 ").unwrap();
        assert_eq!(range.name, "folio_users");
        assert_eq!(range.version, "^8.1");
        assert!(!range.is_exact());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ModuleChange::parse("mod-a").is_none());
        assert!(ModuleChange::parse(":1.0.0").is_none());
        assert!(ModuleChange::parse("mod-a:").is_none());
    }

    #[test]
    fn test_to_dependency_keeps_policy() {
        let dep = ModuleChange::new("mod-a", "^1.0")
            .with_pre_release(PreReleaseFilter::False)
            .to_dependency();
        assert_eq!(dep.version_spec, "^1.0");
        assert_eq!(dep.pre_release, Some(PreReleaseFilter::False));
    }

    #[test]
    fn test_request_builders() {
        let request = UpdateRequest::new()
            .with_change(ModuleType::Ui, ModuleChange::new("folio_users", "latest"))
            .with_project_version("2.0.0");
        assert!(request.changes_of(ModuleType::Be).is_empty());
        assert_eq!(request.changes_of(ModuleType::Ui).len(), 1);
        assert_eq!(request.project_version.as_deref(), Some("2.0.0"));
    }
}
