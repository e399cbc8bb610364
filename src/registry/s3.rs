//! S3-style registry resolver
//!
//! Descriptors live at `{path}{id}.json`. Versions are discovered by listing
//! keys under `{path}{name}-` page by page.

use crate::domain::{Dependency, ModuleType};
use crate::error::RegistryError;
use crate::registry::{
    filter_and_sort, kind_mismatch, versions_for_module, ModuleRegistry, ObjectStore,
    RegistryKind, S3Registry, VersionResolver,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Default listing page size
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// S3-style registry resolver
pub struct S3Resolver {
    store: Arc<dyn ObjectStore>,
    page_size: usize,
}

impl S3Resolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn registry<'a>(&self, registry: &'a ModuleRegistry) -> Result<&'a S3Registry, RegistryError> {
        match registry {
            ModuleRegistry::S3(r) => Ok(r),
            other => Err(kind_mismatch(RegistryKind::S3, other)),
        }
    }

    /// Every key under a prefix, following continuation tokens
    async fn list_all(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, RegistryError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .store
                .list_objects(bucket, prefix, token.as_deref(), self.page_size)
                .await?;
            keys.extend(page.keys);
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(keys)
    }
}

/// Module id encoded in an object key, if the key is a descriptor under `path`
fn module_id_from_key<'a>(key: &'a str, path: &str) -> Option<&'a str> {
    key.strip_prefix(path)?.strip_suffix(".json")
}

#[async_trait]
impl VersionResolver for S3Resolver {
    fn kind(&self) -> RegistryKind {
        RegistryKind::S3
    }

    async fn available_versions(
        &self,
        registry: &ModuleRegistry,
        dependency: &Dependency,
        _module_type: ModuleType,
    ) -> Result<Vec<String>, RegistryError> {
        let s3 = self.registry(registry)?;
        let prefix = format!("{}{}-", s3.path, dependency.name);
        debug!(bucket = %s3.bucket, prefix = %prefix, "listing descriptors");

        let keys = self.list_all(&s3.bucket, &prefix).await?;
        let ids = keys.iter().filter_map(|key| module_id_from_key(key, &s3.path));
        let versions = versions_for_module(ids, &dependency.name);
        Ok(filter_and_sort(versions, dependency.pre_release))
    }

    async fn fetch_descriptor(
        &self,
        registry: &ModuleRegistry,
        module_id: &str,
    ) -> Result<Value, RegistryError> {
        let s3 = self.registry(registry)?;
        let key = s3.object_key(module_id);
        let bytes = self.store.get_object(&s3.bucket, &key).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::invalid_response(
                format!("s3://{}/{}", s3.bucket, key),
                format!("failed to parse JSON: {}", e),
            )
        })
    }
}
