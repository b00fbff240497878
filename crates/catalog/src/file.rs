//! JSON file-backed catalog loader.
//!
//! The file holds an array of resources:
//!
//! ```json
//! [
//!   {
//!     "description": "db-prod",
//!     "admins": ["alice", "bob"],
//!     "approversNeeded": 2,
//!     "withRequestRight": ["carol"]
//!   }
//! ]
//! ```

use crate::StaticCatalog;
use quorum_core::{QuorumError, QuorumResult, Resource};
use std::path::Path;

/// Reads and validates a catalog file.
pub async fn load_catalog(path: impl AsRef<Path>) -> QuorumResult<StaticCatalog> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(QuorumError::InvalidInput(
            "catalog path must not be empty".into(),
        ));
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QuorumError::Catalog(format!("Failed to read {}: {e}", path.display())))?;

    let resources: Vec<Resource> = serde_json::from_str(&raw)
        .map_err(|e| QuorumError::Catalog(format!("Failed to parse {}: {e}", path.display())))?;

    let catalog = StaticCatalog::new(resources)?;
    tracing::info!(path = %path.display(), resources = catalog.len(), "catalog loaded");
    Ok(catalog)
}
