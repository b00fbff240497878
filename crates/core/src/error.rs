//! Centralized error types for the Quorum workspace.

use crate::types::RequestKey;
use thiserror::Error;

/// Top-level error enum.
///
/// Business-rule rejections are detected before any write. The only
/// transient variant is [`QuorumError::ConcurrentConflict`], raised when a
/// per-key compare-and-swap keeps losing races past the retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QuorumError {
    #[error("{applicant} has no request right on {resource}")]
    Ineligible { resource: String, applicant: String },

    #[error("a request for {0} is already pending")]
    DuplicateRequest(RequestKey),

    #[error("{approver} is not an administrator of {resource}")]
    NotAdmin { resource: String, approver: String },

    #[error("{approver} already approved {key}")]
    AlreadyApproved { key: RequestKey, approver: String },

    #[error("{key} has {approvals} of {needed} required approvals")]
    ThresholdNotMet {
        key: RequestKey,
        approvals: usize,
        needed: u32,
    },

    #[error("access for {0} has already been granted")]
    AlreadyGranted(RequestKey),

    #[error("no pending request for {0}")]
    NoPendingRequest(RequestKey),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("concurrent updates on {key} did not settle after {attempts} attempts")]
    ConcurrentConflict { key: RequestKey, attempts: u32 },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification callers use to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The rules rejected the action. Retrying unchanged will fail again.
    BusinessRule,
    /// A concurrent update interfered. Retrying may succeed.
    Transient,
    /// The catalog, store, or input is broken.
    Infrastructure,
}

impl QuorumError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ineligible { .. }
            | Self::DuplicateRequest(_)
            | Self::NotAdmin { .. }
            | Self::AlreadyApproved { .. }
            | Self::ThresholdNotMet { .. }
            | Self::AlreadyGranted(_)
            | Self::NoPendingRequest(_)
            | Self::UnknownResource(_) => ErrorKind::BusinessRule,
            Self::ConcurrentConflict { .. } => ErrorKind::Transient,
            Self::Catalog(_) | Self::Store(_) | Self::InvalidInput(_) | Self::Internal(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    pub fn is_business_rule(&self) -> bool {
        self.kind() == ErrorKind::BusinessRule
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type QuorumResult<T> = Result<T, QuorumError>;
