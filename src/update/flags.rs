//! Update flags
//!
//! This module provides the UpdateFlags struct that encapsulates
//! the switches relaxing or tightening a descriptor update.

/// Flags for a descriptor update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFlags {
    /// Accept versions lower than (or equal to) the current ones
    pub allow_downgrade: bool,
    /// Accept modules the descriptor does not contain yet
    pub allow_add_modules: bool,
    /// Drop modules missing from a non-empty request list of their type
    pub remove_unlisted_modules: bool,
    /// Take the descriptor version from the request's project version
    pub use_project_version: bool,
    /// Keep the descriptor version as is
    pub no_version_bump: bool,
}

impl UpdateFlags {
    /// Create flags with everything disabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_downgrade(mut self, allow: bool) -> Self {
        self.allow_downgrade = allow;
        self
    }

    pub fn with_allow_add_modules(mut self, allow: bool) -> Self {
        self.allow_add_modules = allow;
        self
    }

    pub fn with_remove_unlisted_modules(mut self, remove: bool) -> Self {
        self.remove_unlisted_modules = remove;
        self
    }

    pub fn with_use_project_version(mut self, use_project_version: bool) -> Self {
        self.use_project_version = use_project_version;
        self
    }

    pub fn with_no_version_bump(mut self, no_bump: bool) -> Self {
        self.no_version_bump = no_bump;
        self
    }
}
