//! Module definitions and the module id naming rule
//!
//! A module id is `<name>-<version>`. Names may contain hyphens, so the split
//! happens at the first `-` that is followed by a digit. The irregular form
//! `<name>:latest` is produced for modules whose version is still `latest`.

use crate::version::LATEST;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// First `-<digit>` boundary in a module id
static VERSION_BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d").unwrap());

/// Splits a module id into `(name, version)`.
///
/// Returns `None` when the id has no `-<digit>` boundary and is not in
/// `name:latest` form.
pub fn split_module_id(id: &str) -> Option<(String, String)> {
    if let Some(name) = id.strip_suffix(":latest") {
        if !name.is_empty() {
            return Some((name.to_string(), LATEST.to_string()));
        }
    }

    let boundary = VERSION_BOUNDARY_RE.find(id)?;
    let name = &id[..boundary.start()];
    let version = &id[boundary.start() + 1..];
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

/// Builds a module id from name and version
pub fn module_id(name: &str, version: &str) -> String {
    if version.eq_ignore_ascii_case(LATEST) {
        format!("{}:{}", name, LATEST)
    } else {
        format!("{}-{}", name, version)
    }
}

/// A module reference inside an application descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawModuleDefinition")]
pub struct ModuleDefinition {
    id: String,
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl ModuleDefinition {
    /// Creates a definition; the id is derived from name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            id: module_id(&name, &version),
            name,
            version,
            url: None,
        }
    }

    /// Creates a definition by splitting a module id
    pub fn from_id(id: &str) -> Option<Self> {
        let (name, version) = split_module_id(id)?;
        Some(Self::new(name, version))
    }

    /// Sets the public download URL (builder pattern)
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Wire form; the id is always re-derived from name and version
#[derive(Deserialize)]
struct RawModuleDefinition {
    id: Option<String>,
    name: Option<String>,
    version: Option<String>,
    url: Option<String>,
}

impl TryFrom<RawModuleDefinition> for ModuleDefinition {
    type Error = String;

    fn try_from(raw: RawModuleDefinition) -> Result<Self, Self::Error> {
        let definition = match (raw.name, raw.version, raw.id) {
            (Some(name), Some(version), _) => ModuleDefinition::new(name, version),
            (_, _, Some(id)) => ModuleDefinition::from_id(&id)
                .ok_or_else(|| format!("module id '{}' has no version part", id))?,
            _ => return Err("module definition needs an id or a name and version".to_string()),
        };
        Ok(match raw.url {
            Some(url) => definition.with_url(url),
            None => definition,
        })
    }
}

impl fmt::Display for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(
            split_module_id("mod-users-19.1.0"),
            Some(("mod-users".to_string(), "19.1.0".to_string()))
        );
    }

    #[test]
    fn test_split_prerelease() {
        assert_eq!(
            split_module_id("mod-foo-1.1.0-SNAPSHOT.12"),
            Some(("mod-foo".to_string(), "1.1.0-SNAPSHOT.12".to_string()))
        );
    }

    #[test]
    fn test_split_ui_module() {
        assert_eq!(
            split_module_id("folio_users-11.0.109900000000247"),
            Some(("folio_users".to_string(), "11.0.109900000000247".to_string()))
        );
    }

    #[test]
    fn test_split_latest_form() {
        assert_eq!(
            split_module_id("mod-users:latest"),
            Some(("mod-users".to_string(), "latest".to_string()))
        );
    }

    #[test]
    fn test_split_without_version() {
        assert_eq!(split_module_id("mod-users"), None);
        assert_eq!(split_module_id("-1.0.0"), None);
    }

    #[test]
    fn test_new_derives_id() {
        let def = ModuleDefinition::new("mod-users", "19.1.0");
        assert_eq!(def.id(), "mod-users-19.1.0");
        assert_eq!(def.name(), "mod-users");
        assert_eq!(def.version(), "19.1.0");
        assert!(def.url().is_none());

        let latest = ModuleDefinition::new("mod-users", "latest");
        assert_eq!(latest.id(), "mod-users:latest");
    }

    #[test]
    fn test_id_roundtrip() {
        for (name, version) in [
            ("mod-foo", "1.0.0"),
            ("mod-foo-storage", "2.3.4-SNAPSHOT.7"),
            ("folio_inventory", "12.0.10990000000123"),
            ("edge-oai-pmh", "latest"),
        ] {
            let def = ModuleDefinition::new(name, version);
            let reparsed = ModuleDefinition::from_id(def.id()).unwrap();
            assert_eq!(reparsed.name(), name);
            assert_eq!(reparsed.version(), version);
        }
    }

    #[test]
    fn test_with_url_serialization() {
        let def = ModuleDefinition::new("mod-a", "1.0.0").with_url("http://reg/mod-a-1.0.0");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["id"], "mod-a-1.0.0");
        assert_eq!(json["url"], "http://reg/mod-a-1.0.0");

        let plain = serde_json::to_value(ModuleDefinition::new("mod-a", "1.0.0")).unwrap();
        assert!(plain.get("url").is_none());
    }

    #[test]
    fn test_deserialize_rederives_id() {
        let def: ModuleDefinition =
            serde_json::from_str(r#"{"id":"stale-0.0.1","name":"mod-a","version":"1.2.0"}"#)
                .unwrap();
        assert_eq!(def.id(), "mod-a-1.2.0");

        let def: ModuleDefinition = serde_json::from_str(r#"{"id":"mod-b-2.0.0"}"#).unwrap();
        assert_eq!(def.name(), "mod-b");
        assert_eq!(def.version(), "2.0.0");

        let bad: Result<ModuleDefinition, _> = serde_json::from_str(r#"{"id":"mod-b"}"#);
        assert!(bad.is_err());
    }
}
