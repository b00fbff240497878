//! Flat row schemas for exporting workflow activity.
//!
//! Two row schemas:
//! - [`EventRow`]: one per committed workflow event (append-only, denormalized)
//! - [`GrantRow`]: one per grant record
//!
//! Backend: NDJSON stream to any `Write` impl, see [`json_stream`].

pub mod json_stream;

use crate::events::WorkflowEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use quorum_core::GrantRecord;
use serde::Serialize;

/// One row per workflow event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    /// `request_created`, `approval_recorded`, or `access_granted`.
    pub event: String,
    pub resource: String,
    pub applicant: String,
    /// Approver or grantor; empty for request creation.
    pub party: String,
    pub approvals: u32,
    pub needed: u32,
    pub created_at: String,
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&WorkflowEvent> for EventRow {
    fn from(event: &WorkflowEvent) -> Self {
        match event {
            WorkflowEvent::RequestCreated { key, at } => Self {
                event: "request_created".into(),
                resource: key.resource.clone(),
                applicant: key.applicant.clone(),
                party: String::new(),
                approvals: 0,
                needed: 0,
                created_at: timestamp(at),
            },
            WorkflowEvent::ApprovalRecorded {
                key,
                approver,
                approvals,
                needed,
                at,
            } => Self {
                event: "approval_recorded".into(),
                resource: key.resource.clone(),
                applicant: key.applicant.clone(),
                party: approver.clone(),
                approvals: *approvals as u32,
                needed: *needed,
                created_at: timestamp(at),
            },
            WorkflowEvent::AccessGranted { record, needed } => Self {
                event: "access_granted".into(),
                resource: record.key.resource.clone(),
                applicant: record.key.applicant.clone(),
                party: record.grantor.clone(),
                approvals: record.approvers.len() as u32,
                needed: *needed,
                created_at: timestamp(&record.granted_at),
            },
        }
    }
}

/// One row per grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantRow {
    pub resource: String,
    pub applicant: String,
    pub grantor: String,
    /// Comma-separated, in approval order.
    pub approvers: String,
    pub granted_at: String,
}

impl From<&GrantRecord> for GrantRow {
    fn from(record: &GrantRecord) -> Self {
        Self {
            resource: record.key.resource.clone(),
            applicant: record.key.applicant.clone(),
            grantor: record.grantor.clone(),
            approvers: record.approvers.join(","),
            granted_at: timestamp(&record.granted_at),
        }
    }
}
