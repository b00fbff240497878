//! Entry point for callers: request, approve, grant.
//!
//! Each call reads the resource from the catalog once and uses that
//! snapshot for every check it makes. The calling party is always passed in
//! explicitly.

use crate::aggregator::ApprovalAggregator;
use crate::config::EngineConfig;
use crate::coordinator::GrantCoordinator;
use crate::events::{EventBus, WorkflowEvent};
use crate::registry::RequestRegistry;
use crate::store::{MemoryStore, RecordStore};
use crate::views::{self, PendingView, Report, ResourceView};
use chrono::Utc;
use quorum_catalog::ResourceCatalog;
use quorum_core::{AccessRequest, GrantRecord, QuorumError, QuorumResult, RequestKey};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result of a successful `request_access`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestAccepted {
    pub request: AccessRequest,
    /// The applicant's pending requests after this one was recorded.
    ///
    /// Costs one store read per catalog resource. Collected after the commit
    /// on a best-effort basis: if a read fails, only the new request is
    /// listed.
    pub pending: Vec<RequestKey>,
}

/// Result of a successful `submit_approval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalProgress {
    pub key: RequestKey,
    pub approvals: usize,
    pub needed: u32,
}

impl ApprovalProgress {
    pub fn grantable(&self) -> bool {
        self.approvals >= self.needed as usize
    }
}

pub struct WorkflowFacade {
    catalog: Arc<dyn ResourceCatalog>,
    store: Arc<dyn RecordStore>,
    registry: RequestRegistry,
    aggregator: ApprovalAggregator,
    coordinator: GrantCoordinator,
    events: EventBus,
}

impl WorkflowFacade {
    /// Facade over a fresh in-memory store.
    pub fn new(catalog: Arc<dyn ResourceCatalog>, config: EngineConfig) -> Self {
        Self::with_store(catalog, Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(
        catalog: Arc<dyn ResourceCatalog>,
        store: Arc<dyn RecordStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: RequestRegistry::new(store.clone(), config.max_retries),
            aggregator: ApprovalAggregator::new(store.clone(), config.max_retries),
            coordinator: GrantCoordinator::new(store.clone(), config.max_retries),
            events: EventBus::new(config.event_capacity),
            catalog,
            store,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn request_access(
        &self,
        resource: &str,
        applicant: &str,
    ) -> QuorumResult<RequestAccepted> {
        let resource = self.catalog.resource_of(resource).await?;
        let request = self.registry.request_access(&resource, applicant).await?;
        let key = request.key();

        tracing::info!(resource = %key.resource, applicant, "access requested");
        self.events.publish(WorkflowEvent::RequestCreated {
            key: key.clone(),
            at: request.requested_at,
        });

        // The request is committed; nothing past this point may fail the call.
        let pending = match self.pending_keys_of(applicant).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(
                    %key,
                    error = %e,
                    "pending listing failed, reporting new request only"
                );
                vec![key]
            }
        };

        Ok(RequestAccepted { request, pending })
    }

    async fn pending_keys_of(&self, applicant: &str) -> QuorumResult<Vec<RequestKey>> {
        let mut keys = Vec::new();
        for resource in self.catalog.resources().await? {
            let key = resource.key_for(applicant);
            if self.store.load(&key).await?.slot.is_pending() {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    pub async fn submit_approval(
        &self,
        key: &RequestKey,
        approver: &str,
    ) -> QuorumResult<ApprovalProgress> {
        let resource = self.catalog.resource_of(&key.resource).await?;

        if !resource.is_admin(approver) {
            return Err(QuorumError::NotAdmin {
                resource: resource.description,
                approver: approver.to_string(),
            });
        }
        if self.aggregator.has_approved(key, approver).await? {
            return Err(QuorumError::AlreadyApproved {
                key: key.clone(),
                approver: approver.to_string(),
            });
        }

        let approvals = self
            .aggregator
            .submit_approval(&resource, key, approver)
            .await?;
        let needed = resource.approvers_needed;
        let at = Utc::now();

        tracing::info!(%key, approver, approvals, needed, "approval recorded");
        self.events.publish(WorkflowEvent::ApprovalRecorded {
            key: key.clone(),
            approver: approver.to_string(),
            approvals,
            needed,
            at,
        });

        Ok(ApprovalProgress {
            key: key.clone(),
            approvals,
            needed,
        })
    }

    pub async fn attempt_grant(&self, key: &RequestKey, grantor: &str) -> QuorumResult<GrantRecord> {
        let resource = self.catalog.resource_of(&key.resource).await?;
        let record = self
            .coordinator
            .attempt_grant(&resource, key, grantor)
            .await?;

        tracing::info!(
            %key,
            grantor,
            approvers = record.approvers.len(),
            "access granted"
        );
        self.events.publish(WorkflowEvent::AccessGranted {
            record: record.clone(),
            needed: resource.approvers_needed,
        });

        Ok(record)
    }

    pub async fn is_pending(&self, key: &RequestKey) -> QuorumResult<bool> {
        self.registry.is_pending(key).await
    }

    pub async fn approval_count(&self, key: &RequestKey) -> QuorumResult<usize> {
        self.aggregator.approval_count(key).await
    }

    pub async fn has_approved(&self, key: &RequestKey, party: &str) -> QuorumResult<bool> {
        self.aggregator.has_approved(key, party).await
    }

    pub async fn grants(&self) -> QuorumResult<Vec<GrantRecord>> {
        self.coordinator.grants().await
    }

    pub async fn resources_for(&self, party: &str) -> QuorumResult<Vec<ResourceView>> {
        let resources = self.catalog.resources().await?;
        let entries = self.store.entries().await?;
        Ok(views::resource_views(party, &resources, &entries))
    }

    pub async fn pending_for(&self, party: &str) -> QuorumResult<Vec<PendingView>> {
        let resources = self.catalog.resources().await?;
        let entries = self.store.entries().await?;
        Ok(views::pending_views(party, &resources, &entries))
    }

    pub async fn report_for(&self, party: &str) -> QuorumResult<Report> {
        let resources = self.catalog.resources().await?;
        let entries = self.store.entries().await?;
        Ok(Report::build(party, &resources, &entries))
    }
}
