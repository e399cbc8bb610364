//! Container registry checker
//!
//! Uses the Docker Hub tag endpoint:
//! `GET {base}/v2/namespaces/{namespace}/repositories/{name}/tags/{version}`

use crate::artifact::ArtifactChecker;
use crate::domain::ModuleDefinition;
use crate::error::RegistryError;
use crate::registry::{ArtifactRegistry, HttpClient};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Container image tag checker
pub struct ContainerChecker {
    client: HttpClient,
}

impl ContainerChecker {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build the tag URL for a module version
    fn build_url(&self, registry: &ArtifactRegistry, module: &ModuleDefinition) -> String {
        format!(
            "{}/v2/namespaces/{}/repositories/{}/tags/{}",
            registry.base_url().trim_end_matches('/'),
            registry.namespace(),
            module.name(),
            module.version()
        )
    }
}

#[async_trait]
impl ArtifactChecker for ContainerChecker {
    async fn exists(
        &self,
        module: &ModuleDefinition,
        registry: &ArtifactRegistry,
    ) -> Result<bool, RegistryError> {
        let url = self.build_url(registry, module);
        let response = self.client.get(&url).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(RegistryError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            }),
        }
    }
}
