//! Approval aggregation: one administrator, one vote, per request key.
//!
//! Approvals are merged into the single [`ApprovalState`] stored under the
//! request's key. Two administrators approving at the same time both land:
//! the loser of the compare-and-swap re-reads the winner's state and adds
//! itself to it.

use crate::atomic::update_slot;
use crate::store::RecordStore;
use quorum_core::{ApprovalState, QuorumError, QuorumResult, RequestKey, Resource};
use std::sync::Arc;

pub struct ApprovalAggregator {
    store: Arc<dyn RecordStore>,
    max_retries: u32,
}

impl ApprovalAggregator {
    pub fn new(store: Arc<dyn RecordStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Records `approver`'s vote on `key` and returns the new approval count.
    ///
    /// `resource` is the catalog snapshot read for this submission; admin
    /// membership is judged against it.
    pub async fn submit_approval(
        &self,
        resource: &Resource,
        key: &RequestKey,
        approver: &str,
    ) -> QuorumResult<usize> {
        if key.resource != resource.description {
            return Err(QuorumError::InvalidInput(format!(
                "{key} does not belong to {}",
                resource.description
            )));
        }
        if !resource.is_admin(approver) {
            return Err(QuorumError::NotAdmin {
                resource: resource.description.clone(),
                approver: approver.to_string(),
            });
        }

        update_slot(self.store.as_ref(), key, self.max_retries, |slot| {
            if slot.grant.is_some() {
                return Err(QuorumError::AlreadyGranted(key.clone()));
            }
            if slot.request.is_none() {
                return Err(QuorumError::NoPendingRequest(key.clone()));
            }

            let mut next = slot.clone();
            let approval = next.approval.get_or_insert_with(ApprovalState::default);
            if !approval.insert(approver) {
                return Err(QuorumError::AlreadyApproved {
                    key: key.clone(),
                    approver: approver.to_string(),
                });
            }
            let count = approval.count();
            Ok((next, count))
        })
        .await
    }

    pub async fn approval_count(&self, key: &RequestKey) -> QuorumResult<usize> {
        Ok(self.store.load(key).await?.slot.approval_count())
    }

    pub async fn has_approved(&self, key: &RequestKey, party: &str) -> QuorumResult<bool> {
        Ok(self.store.load(key).await?.slot.has_approved(party))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RequestRegistry;
    use crate::store::MemoryStore;

    fn db_prod() -> Resource {
        Resource::new("db-prod", ["alice", "bob", "erin"], 2, ["carol"])
    }

    async fn with_request() -> (ApprovalAggregator, RequestKey) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let request = RequestRegistry::new(store.clone(), 8)
            .request_access(&db_prod(), "carol")
            .await
            .unwrap();
        (ApprovalAggregator::new(store, 8), request.key())
    }

    #[tokio::test]
    async fn distinct_admins_accumulate() {
        let (aggregator, key) = with_request().await;
        let resource = db_prod();

        assert_eq!(aggregator.approval_count(&key).await.unwrap(), 0);
        assert_eq!(
            aggregator.submit_approval(&resource, &key, "alice").await,
            Ok(1)
        );
        assert_eq!(
            aggregator.submit_approval(&resource, &key, "erin").await,
            Ok(2)
        );
        assert!(aggregator.has_approved(&key, "erin").await.unwrap());
        assert!(!aggregator.has_approved(&key, "bob").await.unwrap());
    }

    #[tokio::test]
    async fn repeat_approval_leaves_count_alone() {
        let (aggregator, key) = with_request().await;
        let resource = db_prod();

        aggregator
            .submit_approval(&resource, &key, "alice")
            .await
            .unwrap();
        let err = aggregator
            .submit_approval(&resource, &key, "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, QuorumError::AlreadyApproved { .. }));
        assert_eq!(aggregator.approval_count(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_admin_rejected_before_any_write() {
        let (aggregator, key) = with_request().await;
        let err = aggregator
            .submit_approval(&db_prod(), &key, "carol")
            .await
            .unwrap_err();

        assert!(matches!(err, QuorumError::NotAdmin { .. }));
        assert_eq!(aggregator.approval_count(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn approval_needs_a_live_request() {
        let aggregator = ApprovalAggregator::new(Arc::new(MemoryStore::new()), 8);
        let key = RequestKey::new("db-prod", "carol");
        let err = aggregator
            .submit_approval(&db_prod(), &key, "alice")
            .await
            .unwrap_err();
        assert_eq!(err, QuorumError::NoPendingRequest(key));
    }

    #[tokio::test]
    async fn key_must_match_resource() {
        let (aggregator, _) = with_request().await;
        let foreign = RequestKey::new("wiki", "carol");
        let err = aggregator
            .submit_approval(&db_prod(), &foreign, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, QuorumError::InvalidInput(_)));
    }
}
