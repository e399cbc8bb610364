//! Dependency declarations and prerelease policy

use crate::version::{is_exact_version, LATEST};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Policy controlling whether prerelease versions are eligible matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreReleaseFilter {
    /// Only prerelease versions are eligible
    Only,
    /// Prerelease and release versions are eligible
    True,
    /// Only release versions are eligible
    False,
}

impl PreReleaseFilter {
    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PreReleaseFilter::Only => "only",
            PreReleaseFilter::True => "true",
            PreReleaseFilter::False => "false",
        }
    }

    /// Parses the wire representation (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "only" => Some(PreReleaseFilter::Only),
            "true" => Some(PreReleaseFilter::True),
            "false" => Some(PreReleaseFilter::False),
            _ => None,
        }
    }
}

impl fmt::Display for PreReleaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PreReleaseFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PreReleaseFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Templates use both `"preRelease": true` and `"preRelease": "only"`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(true) => Ok(PreReleaseFilter::True),
            Raw::Bool(false) => Ok(PreReleaseFilter::False),
            Raw::Text(text) => PreReleaseFilter::parse(&text).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid preRelease value '{}': expected 'only', 'true' or 'false'",
                    text
                ))
            }),
        }
    }
}

/// A declared module dependency: name, version constraint, prerelease policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Module name
    pub name: String,
    /// Exact version, semver range, or the literal `latest`
    #[serde(rename = "version")]
    pub version_spec: String,
    /// Prerelease policy, unset means "include"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_release: Option<PreReleaseFilter>,
}

impl Dependency {
    /// Creates a dependency with no prerelease policy
    pub fn new(name: impl Into<String>, version_spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_spec: version_spec.into(),
            pre_release: None,
        }
    }

    /// Sets the prerelease policy (builder pattern)
    pub fn with_pre_release(mut self, filter: PreReleaseFilter) -> Self {
        self.pre_release = Some(filter);
        self
    }

    /// Returns a copy pinned to a resolved version, keeping the prerelease policy
    pub fn resolved(&self, version: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            version_spec: version.into(),
            pre_release: self.pre_release,
        }
    }

    /// Returns true if the version spec is already an exact version
    pub fn is_exact(&self) -> bool {
        is_exact_version(&self.version_spec)
    }

    /// Returns true if the version spec is the literal `latest`
    pub fn is_latest(&self) -> bool {
        self.version_spec.trim().eq_ignore_ascii_case(LATEST)
    }

    /// Returns the module id for an exact version (`name-version`)
    pub fn module_id(&self) -> String {
        format!("{}-{}", self.name, self.version_spec)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version_spec)?;
        if let Some(filter) = self.pre_release {
            write!(f, " (preRelease={})", filter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_new() {
        let dep = Dependency::new("mod-users", "^19.0.0");
        assert_eq!(dep.name, "mod-users");
        assert_eq!(dep.version_spec, "^19.0.0");
        assert!(dep.pre_release.is_none());
    }

    #[test]
    fn test_resolved_keeps_filter() {
        let dep = Dependency::new("mod-users", "*").with_pre_release(PreReleaseFilter::Only);
        let resolved = dep.resolved("19.1.0-SNAPSHOT.5");
        assert_eq!(resolved.version_spec, "19.1.0-SNAPSHOT.5");
        assert_eq!(resolved.pre_release, Some(PreReleaseFilter::Only));
        assert_eq!(dep.version_spec, "*");
    }

    #[test]
    fn test_is_exact_and_latest() {
        assert!(Dependency::new("a", "1.2.3").is_exact());
        assert!(Dependency::new("a", "11.0.109900000000247").is_exact());
        assert!(!Dependency::new("a", "^1.2.3").is_exact());
        assert!(Dependency::new("a", "latest").is_latest());
        assert!(Dependency::new("a", "LATEST").is_latest());
        assert!(!Dependency::new("a", "1.0.0").is_latest());
    }

    #[test]
    fn test_module_id() {
        assert_eq!(
            Dependency::new("mod-users", "19.0.0").module_id(),
            "mod-users-19.0.0"
        );
    }

    #[test]
    fn test_display() {
        let dep = Dependency::new("mod-a", "^1.0.0").with_pre_release(PreReleaseFilter::False);
        assert_eq!(dep.to_string(), "mod-a@^1.0.0 (preRelease=false)");
        assert_eq!(Dependency::new("mod-a", "1.0.0").to_string(), "mod-a@1.0.0");
    }

    #[test]
    fn test_deserialize_prerelease_variants() {
        let dep: Dependency =
            serde_json::from_str(r#"{"name":"a","version":"*","preRelease":true}"#).unwrap();
        assert_eq!(dep.pre_release, Some(PreReleaseFilter::True));

        let dep: Dependency =
            serde_json::from_str(r#"{"name":"a","version":"*","preRelease":"only"}"#).unwrap();
        assert_eq!(dep.pre_release, Some(PreReleaseFilter::Only));

        let dep: Dependency =
            serde_json::from_str(r#"{"name":"a","version":"*","preRelease":"FALSE"}"#).unwrap();
        assert_eq!(dep.pre_release, Some(PreReleaseFilter::False));

        let dep: Dependency = serde_json::from_str(r#"{"name":"a","version":"*"}"#).unwrap();
        assert!(dep.pre_release.is_none());
    }

    #[test]
    fn test_deserialize_invalid_prerelease() {
        let result: Result<Dependency, _> =
            serde_json::from_str(r#"{"name":"a","version":"*","preRelease":"maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_dependency() {
        let dep = Dependency::new("mod-a", "1.0.0").with_pre_release(PreReleaseFilter::Only);
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["preRelease"], "only");
    }
}
