//! Change report produced by a descriptor update

use super::ModuleType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a module changed between two descriptor versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Upgraded,
    Downgraded,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "added",
            ChangeKind::Upgraded => "upgraded",
            ChangeKind::Downgraded => "downgraded",
            ChangeKind::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// One module change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleChangeEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Changes for one module type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleChanges {
    pub added: Vec<ModuleChangeEntry>,
    pub upgraded: Vec<ModuleChangeEntry>,
    pub downgraded: Vec<ModuleChangeEntry>,
    pub removed: Vec<ModuleChangeEntry>,
}

impl ModuleChanges {
    /// Records a change
    pub fn record(
        &mut self,
        kind: ChangeKind,
        name: impl Into<String>,
        from: Option<String>,
        to: Option<String>,
    ) {
        let entry = ModuleChangeEntry {
            name: name.into(),
            from,
            to,
        };
        match kind {
            ChangeKind::Added => self.added.push(entry),
            ChangeKind::Upgraded => self.upgraded.push(entry),
            ChangeKind::Downgraded => self.downgraded.push(entry),
            ChangeKind::Removed => self.removed.push(entry),
        }
    }

    /// Entries of one change kind
    pub fn entries(&self, kind: ChangeKind) -> &[ModuleChangeEntry] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Upgraded => &self.upgraded,
            ChangeKind::Downgraded => &self.downgraded,
            ChangeKind::Removed => &self.removed,
        }
    }

    /// Module names of one change kind
    pub fn names(&self, kind: ChangeKind) -> Vec<&str> {
        self.entries(kind).iter().map(|e| e.name.as_str()).collect()
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.added.len() + self.upgraded.len() + self.downgraded.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Report of a descriptor update: what changed per module type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub previous_id: String,
    pub application_id: String,
    pub modules: ModuleChanges,
    pub ui_modules: ModuleChanges,
}

impl UpdateReport {
    /// Creates an empty report
    pub fn new(previous_id: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            previous_id: previous_id.into(),
            application_id: application_id.into(),
            modules: ModuleChanges::default(),
            ui_modules: ModuleChanges::default(),
        }
    }

    /// Changes for the given module type
    pub fn changes(&self, module_type: ModuleType) -> &ModuleChanges {
        match module_type {
            ModuleType::Be => &self.modules,
            ModuleType::Ui => &self.ui_modules,
        }
    }

    /// Mutable changes for the given module type
    pub fn changes_mut(&mut self, module_type: ModuleType) -> &mut ModuleChanges {
        match module_type {
            ModuleType::Be => &mut self.modules,
            ModuleType::Ui => &mut self.ui_modules,
        }
    }

    /// Total number of module changes across types
    pub fn total_changes(&self) -> usize {
        self.modules.total() + self.ui_modules.total()
    }

    /// Returns true if any module changed
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}
