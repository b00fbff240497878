//! Approval aggregation and exactly-once grant state machine.
//!
//! All state for one `(resource, applicant)` key lives in a single slot of a
//! [`RecordStore`](store::RecordStore) and changes only through
//! [`atomic::update_slot`]. The [`WorkflowFacade`] is the entry point.

pub mod aggregator;
pub mod atomic;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod facade;
pub mod registry;
pub mod sink;
pub mod store;
pub mod views;

pub use config::EngineConfig;
pub use events::{EventBus, WorkflowEvent};
pub use facade::{ApprovalProgress, RequestAccepted, WorkflowFacade};
pub use store::{CasOutcome, MemoryStore, RecordStore, Versioned};
