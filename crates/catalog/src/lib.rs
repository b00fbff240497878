//! Resource catalog abstraction for Quorum.
//!
//! The engine only ever reads resources; each read is treated as the
//! authoritative snapshot for the operation that made it.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use quorum_core::{QuorumResult, Resource};

pub use file::load_catalog;
pub use memory::StaticCatalog;

/// Source of resource definitions.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// Returns the current definition of `description`, or `UnknownResource`.
    async fn resource_of(&self, description: &str) -> QuorumResult<Resource>;

    /// Every known resource, ordered by description.
    async fn resources(&self) -> QuorumResult<Vec<Resource>>;
}
