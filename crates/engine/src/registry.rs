//! Outstanding access requests per `(resource, applicant)`.

use crate::atomic::update_slot;
use crate::store::RecordStore;
use chrono::Utc;
use quorum_core::{AccessRequest, KeySlot, QuorumError, QuorumResult, RequestKey, Resource};
use std::sync::Arc;

pub struct RequestRegistry {
    store: Arc<dyn RecordStore>,
    max_retries: u32,
}

impl RequestRegistry {
    pub fn new(store: Arc<dyn RecordStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Opens a request for `applicant` on `resource`.
    ///
    /// A granted key stays granted: asking again reports `AlreadyGranted`.
    pub async fn request_access(
        &self,
        resource: &Resource,
        applicant: &str,
    ) -> QuorumResult<AccessRequest> {
        if !resource.has_request_right(applicant) {
            return Err(QuorumError::Ineligible {
                resource: resource.description.clone(),
                applicant: applicant.to_string(),
            });
        }

        let key = resource.key_for(applicant);
        update_slot(self.store.as_ref(), &key, self.max_retries, |slot| {
            if slot.grant.is_some() {
                return Err(QuorumError::AlreadyGranted(key.clone()));
            }
            if slot.request.is_some() {
                return Err(QuorumError::DuplicateRequest(key.clone()));
            }

            let request = AccessRequest {
                resource: resource.clone(),
                applicant: applicant.to_string(),
                requested_at: Utc::now(),
            };
            let next = KeySlot {
                request: Some(request.clone()),
                approval: None,
                grant: None,
            };
            Ok((next, request))
        })
        .await
    }

    pub async fn is_pending(&self, key: &RequestKey) -> QuorumResult<bool> {
        Ok(self.store.load(key).await?.slot.is_pending())
    }

    /// Every pending request, ordered by key.
    pub async fn pending(&self) -> QuorumResult<Vec<AccessRequest>> {
        Ok(self
            .store
            .entries()
            .await?
            .into_iter()
            .filter(|(_, slot)| slot.is_pending())
            .filter_map(|(_, slot)| slot.request)
            .collect())
    }
}
