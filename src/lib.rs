//! appdesc - Application descriptor resolver and updater library
//!
//! This library resolves module version constraints against several kinds
//! of module registries and builds or updates application descriptors:
//! - Okapi-style, flat catalog and S3-style module registries
//! - Prerelease policy and snapshot version normalization
//! - Artifact existence checks (container images, npm packages)
//! - Descriptor generation from templates and no-downgrade updates

pub mod artifact;
pub mod config;
pub mod descriptor;
pub mod domain;
pub mod error;
pub mod logging;
pub mod output;
pub mod registry;
pub mod resolve;
pub mod update;
pub mod version;

#[cfg(test)]
mod test_support;
