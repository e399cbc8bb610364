//! Semantic version handling
//!
//! This module provides:
//! - Snapshot-patch normalization applied before every semver parse
//! - Constraint parsing with npm-style range syntax
//! - Prerelease policy checks shared by all resolvers

mod constraint;
mod normalize;

pub use constraint::{
    eligible_version, includes_prerelease, prerelease_admitted, InvalidConstraint,
    VersionConstraint, LATEST,
};
pub use normalize::{
    compare_versions, increment_patch, is_exact_version, is_prerelease, normalize_version,
    parse_version, sort_descending,
};
