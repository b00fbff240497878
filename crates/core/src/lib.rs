//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod types;

pub use error::{ErrorKind, QuorumError, QuorumResult};
pub use types::{
    AccessRequest, ApprovalState, GrantRecord, KeyPhase, KeySlot, RequestKey, Resource,
};
