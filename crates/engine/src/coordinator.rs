//! Exactly-once grant transition.

use crate::atomic::update_slot;
use crate::store::RecordStore;
use chrono::Utc;
use quorum_core::{GrantRecord, KeySlot, QuorumError, QuorumResult, RequestKey, Resource};
use std::sync::Arc;

pub struct GrantCoordinator {
    store: Arc<dyn RecordStore>,
    max_retries: u32,
}

impl GrantCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Grants access on `key` once the threshold of `resource` is met.
    ///
    /// The grant record replaces the request and its approvals in one swap,
    /// so of several racing callers exactly one succeeds and the rest see
    /// `AlreadyGranted`.
    pub async fn attempt_grant(
        &self,
        resource: &Resource,
        key: &RequestKey,
        grantor: &str,
    ) -> QuorumResult<GrantRecord> {
        if key.resource != resource.description {
            return Err(QuorumError::InvalidInput(format!(
                "{key} does not belong to {}",
                resource.description
            )));
        }

        update_slot(self.store.as_ref(), key, self.max_retries, |slot| {
            if slot.grant.is_some() {
                return Err(QuorumError::AlreadyGranted(key.clone()));
            }
            if slot.request.is_none() {
                return Err(QuorumError::NoPendingRequest(key.clone()));
            }
            if !slot.is_grantable(resource.approvers_needed) {
                return Err(QuorumError::ThresholdNotMet {
                    key: key.clone(),
                    approvals: slot.approval_count(),
                    needed: resource.approvers_needed,
                });
            }

            let record = GrantRecord {
                key: key.clone(),
                grantor: grantor.to_string(),
                approvers: slot
                    .approval
                    .as_ref()
                    .map(|a| a.approvers().to_vec())
                    .unwrap_or_default(),
                granted_at: Utc::now(),
            };
            let next = KeySlot {
                request: None,
                approval: None,
                grant: Some(record.clone()),
            };
            Ok((next, record))
        })
        .await
    }

    pub async fn grant_of(&self, key: &RequestKey) -> QuorumResult<Option<GrantRecord>> {
        Ok(self.store.load(key).await?.slot.grant)
    }

    /// Every grant ever issued, ordered by key.
    pub async fn grants(&self) -> QuorumResult<Vec<GrantRecord>> {
        Ok(self
            .store
            .entries()
            .await?
            .into_iter()
            .filter_map(|(_, slot)| slot.grant)
            .collect())
    }
}
