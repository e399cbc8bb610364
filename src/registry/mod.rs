//! Module registries and the version resolvers that query them
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Registry model (module and artifact registries) with validation
//! - Okapi-style, flat catalog and S3-style version resolvers
//! - Object store transport for S3-style registries
//! - Resolver facade dispatching by registry kind

mod client;
mod facade;
mod model;
mod object_store;
mod okapi;
mod s3;
mod simple;

pub use client::{
    is_retryable_status, HttpClient, BASE_DELAY_MS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    MAX_RETRIES,
};
pub use facade::{ResolverFacade, VersionLookup};
pub use model::{
    is_well_formed_url, ArtifactRegistries, ArtifactRegistry, ArtifactRegistryGroup,
    ContainerRegistry, ModuleRegistries, ModuleRegistry, ModuleRegistryGroup, OkapiRegistry,
    PackageRegistry, RegistryKind, S3Registry, SimpleRegistry, DEFAULT_CONTAINER_REGISTRY_URL,
    DEFAULT_PACKAGE_REGISTRY_URL, MODULE_ID_PLACEHOLDER,
};
pub use object_store::{ObjectListing, ObjectStore, S3ObjectStore, DEFAULT_REGION};
pub use okapi::OkapiResolver;
pub use s3::{S3Resolver, DEFAULT_PAGE_SIZE};
pub use simple::SimpleResolver;

use crate::domain::{split_module_id, Dependency, ModuleType, PreReleaseFilter};
use crate::error::RegistryError;
use crate::version::{parse_version, prerelease_admitted, sort_descending};
use async_trait::async_trait;
use serde_json::Value;

/// Lists versions and fetches descriptors for one kind of module registry
#[async_trait]
pub trait VersionResolver: Send + Sync {
    /// The registry kind this resolver handles
    fn kind(&self) -> RegistryKind;

    /// All versions of the dependency's module available in the registry.
    ///
    /// A module with no entries yields `Ok(vec![])`.
    async fn available_versions(
        &self,
        registry: &ModuleRegistry,
        dependency: &Dependency,
        module_type: ModuleType,
    ) -> Result<Vec<String>, RegistryError>;

    /// Full module descriptor for a module id
    async fn fetch_descriptor(
        &self,
        registry: &ModuleRegistry,
        module_id: &str,
    ) -> Result<Value, RegistryError>;
}

/// Versions of `module_name` found among catalog ids.
///
/// Ids whose name part differs from `module_name` are discarded, which
/// guards against prefix collisions such as `mod-foo` vs `mod-foo-storage`.
pub(crate) fn versions_for_module<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    module_name: &str,
) -> Vec<String> {
    ids.into_iter()
        .filter_map(split_module_id)
        .filter(|(name, _)| name == module_name)
        .map(|(_, version)| version)
        .collect()
}

/// Drops unparsable versions and those the prerelease policy rejects, then
/// sorts descending.
pub(crate) fn filter_and_sort(
    versions: Vec<String>,
    filter: Option<PreReleaseFilter>,
) -> Vec<String> {
    let admitted = versions
        .into_iter()
        .filter(|v| {
            parse_version(v)
                .map(|parsed| prerelease_admitted(filter, &parsed))
                .unwrap_or(false)
        })
        .collect();
    sort_descending(admitted)
}

/// Treats a 404 as "module has no entries"
pub(crate) fn empty_on_not_found<T: Default>(
    result: Result<T, RegistryError>,
) -> Result<T, RegistryError> {
    match result {
        Err(RegistryError::UnexpectedStatus { status: 404, .. }) => Ok(T::default()),
        other => other,
    }
}

/// Maps a 404 on a descriptor fetch to `NotFound`
pub(crate) fn not_found_on_404(
    result: Result<Value, RegistryError>,
    module_id: &str,
    registry: &ModuleRegistry,
) -> Result<Value, RegistryError> {
    match result {
        Err(RegistryError::UnexpectedStatus { status: 404, .. }) => {
            Err(RegistryError::not_found(module_id, registry.location()))
        }
        other => other,
    }
}

pub(crate) fn kind_mismatch(expected: RegistryKind, registry: &ModuleRegistry) -> RegistryError {
    RegistryError::invalid_response(
        registry.location(),
        format!("{} resolver cannot query a {} registry", expected, registry.kind()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_for_module_guards_prefix() {
        let ids = [
            "mod-foo-1.0.0",
            "mod-foo-storage-1.2.0",
            "mod-foo-1.1.0-SNAPSHOT",
            "garbage",
        ];
        let versions = versions_for_module(ids, "mod-foo");
        assert_eq!(versions, vec!["1.0.0", "1.1.0-SNAPSHOT"]);
    }

    #[test]
    fn test_filter_and_sort() {
        let versions = vec![
            "1.0.0".to_string(),
            "1.1.0-SNAPSHOT".to_string(),
            "0.9.0".to_string(),
            "bogus".to_string(),
        ];
        assert_eq!(
            filter_and_sort(versions.clone(), Some(PreReleaseFilter::False)),
            vec!["1.0.0", "0.9.0"]
        );
        assert_eq!(
            filter_and_sort(versions.clone(), Some(PreReleaseFilter::Only)),
            vec!["1.1.0-SNAPSHOT"]
        );
        assert_eq!(
            filter_and_sort(versions, None),
            vec!["1.1.0-SNAPSHOT", "1.0.0", "0.9.0"]
        );
    }

    #[test]
    fn test_empty_on_not_found() {
        let result: Result<Vec<String>, _> = Err(RegistryError::UnexpectedStatus {
            url: "http://x".into(),
            status: 404,
        });
        assert_eq!(empty_on_not_found(result).unwrap(), Vec::<String>::new());

        let result: Result<Vec<String>, _> = Err(RegistryError::UnexpectedStatus {
            url: "http://x".into(),
            status: 500,
        });
        assert!(empty_on_not_found(result).is_err());
    }
}
