//! Module type definitions (backend vs UI)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of module an application is composed of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Backend module (container image)
    Be,
    /// UI module (npm package)
    Ui,
}

impl ModuleType {
    /// Returns the name of the Okapi query flag that admits prerelease builds
    pub fn prerelease_query_param(&self) -> &'static str {
        match self {
            ModuleType::Be => "preRelease",
            ModuleType::Ui => "npmSnapshot",
        }
    }

    /// Returns the display name for this module type
    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleType::Be => "backend",
            ModuleType::Ui => "UI",
        }
    }

    /// Returns all module types
    pub fn all() -> &'static [ModuleType] {
        &[ModuleType::Be, ModuleType::Ui]
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
