//! In-memory catalog built once from a list of resources.

use crate::ResourceCatalog;
use async_trait::async_trait;
use quorum_core::{QuorumError, QuorumResult, Resource};
use std::collections::BTreeMap;

/// Immutable catalog keyed by resource description.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    resources: BTreeMap<String, Resource>,
}

impl StaticCatalog {
    /// Builds a catalog, rejecting invalid or duplicate definitions.
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> QuorumResult<Self> {
        let mut by_description = BTreeMap::new();
        for resource in resources {
            resource.validate()?;
            if by_description.contains_key(&resource.description) {
                return Err(QuorumError::InvalidInput(format!(
                    "duplicate resource: {}",
                    resource.description
                )));
            }
            by_description.insert(resource.description.clone(), resource);
        }

        tracing::debug!(resources = by_description.len(), "catalog built");
        Ok(Self {
            resources: by_description,
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceCatalog for StaticCatalog {
    async fn resource_of(&self, description: &str) -> QuorumResult<Resource> {
        self.resources
            .get(description)
            .cloned()
            .ok_or_else(|| QuorumError::UnknownResource(description.to_string()))
    }

    async fn resources(&self) -> QuorumResult<Vec<Resource>> {
        Ok(self.resources.values().cloned().collect())
    }
}
