//! Domain types for the Quorum approval engine.

use crate::error::{QuorumError, QuorumResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A protectable asset with an admin set and an approval threshold.
///
/// Supplied by the catalog and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub description: String,
    pub admins: BTreeSet<String>,
    pub approvers_needed: u32,
    #[serde(default)]
    pub with_request_right: BTreeSet<String>,
}

impl Resource {
    pub fn new<A, R>(
        description: impl Into<String>,
        admins: A,
        approvers_needed: u32,
        requesters: R,
    ) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            description: description.into(),
            admins: admins.into_iter().map(Into::into).collect(),
            approvers_needed,
            with_request_right: requesters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, party: &str) -> bool {
        self.admins.contains(party)
    }

    pub fn has_request_right(&self, party: &str) -> bool {
        self.with_request_right.contains(party)
    }

    pub fn key_for(&self, applicant: &str) -> RequestKey {
        RequestKey::new(&self.description, applicant)
    }

    /// Rejects definitions that could never be granted.
    pub fn validate(&self) -> QuorumResult<()> {
        if self.description.trim().is_empty() {
            return Err(QuorumError::InvalidInput(
                "resource description must not be empty".into(),
            ));
        }
        if self.admins.is_empty() {
            return Err(QuorumError::InvalidInput(format!(
                "{} has no administrators",
                self.description
            )));
        }
        if self.approvers_needed == 0 {
            return Err(QuorumError::InvalidInput(format!(
                "{} needs a positive approval threshold",
                self.description
            )));
        }
        if self.approvers_needed as usize > self.admins.len() {
            return Err(QuorumError::InvalidInput(format!(
                "{} needs {} approvals but has only {} administrators",
                self.description,
                self.approvers_needed,
                self.admins.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Keys and per-key records
// ---------------------------------------------------------------------------

/// Composite `(resource description, applicant)` key.
///
/// Every request, approval, and grant is addressed by this key directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub resource: String,
    pub applicant: String,
}

impl RequestKey {
    pub fn new(resource: impl Into<String>, applicant: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            applicant: applicant.into(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource, self.applicant)
    }
}

/// A live request for access, holding the resource snapshot it was made against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub resource: Resource,
    pub applicant: String,
    pub requested_at: DateTime<Utc>,
}

impl AccessRequest {
    pub fn key(&self) -> RequestKey {
        self.resource.key_for(&self.applicant)
    }
}

/// Distinct administrators that approved one request, in arrival order.
///
/// Approval sets are tiny, so `SmallVec<[String; 4]>` keeps them inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalState {
    approved_by: SmallVec<[String; 4]>,
}

impl ApprovalState {
    pub fn first(approver: impl Into<String>) -> Self {
        let mut approved_by = SmallVec::new();
        approved_by.push(approver.into());
        Self { approved_by }
    }

    /// Adds `approver` unless already present. Returns whether it was added.
    pub fn insert(&mut self, approver: &str) -> bool {
        if self.has_approved(approver) {
            return false;
        }
        self.approved_by.push(approver.to_string());
        true
    }

    pub fn has_approved(&self, party: &str) -> bool {
        self.approved_by.iter().any(|p| p == party)
    }

    pub fn count(&self) -> usize {
        self.approved_by.len()
    }

    pub fn approvers(&self) -> &[String] {
        &self.approved_by
    }
}

/// Permanent record of access having been granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub key: RequestKey,
    pub grantor: String,
    pub approvers: Vec<String>,
    pub granted_at: DateTime<Utc>,
}

/// Everything stored for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySlot {
    pub request: Option<AccessRequest>,
    pub approval: Option<ApprovalState>,
    pub grant: Option<GrantRecord>,
}

/// Stored phase of a key. "Grantable" is derived from the count and the
/// resource threshold, see [`KeySlot::is_grantable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPhase {
    NoRequest,
    Requested,
    Approving,
    Granted,
}

impl KeySlot {
    pub fn phase(&self) -> KeyPhase {
        match (&self.request, &self.approval, &self.grant) {
            (_, _, Some(_)) => KeyPhase::Granted,
            (Some(_), Some(_), None) => KeyPhase::Approving,
            (Some(_), None, None) => KeyPhase::Requested,
            (None, _, None) => KeyPhase::NoRequest,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.request.is_some() && self.grant.is_none()
    }

    pub fn approval_count(&self) -> usize {
        self.approval.as_ref().map_or(0, ApprovalState::count)
    }

    pub fn has_approved(&self, party: &str) -> bool {
        self.approval
            .as_ref()
            .is_some_and(|a| a.has_approved(party))
    }

    pub fn is_grantable(&self, needed: u32) -> bool {
        self.is_pending() && self.approval_count() >= needed as usize
    }
}
