//! Workflow events for observers.
//!
//! Events are published after the write they describe has committed. A
//! subscriber that falls more than the configured capacity behind receives
//! `RecvError::Lagged` and should re-read state through the views. Every
//! event carries the commit time of its write.

use chrono::{DateTime, Utc};
use quorum_core::{GrantRecord, RequestKey};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RequestCreated {
        key: RequestKey,
        at: DateTime<Utc>,
    },
    ApprovalRecorded {
        key: RequestKey,
        approver: String,
        approvals: usize,
        needed: u32,
        at: DateTime<Utc>,
    },
    AccessGranted {
        record: GrantRecord,
        needed: u32,
    },
}

impl WorkflowEvent {
    pub fn key(&self) -> &RequestKey {
        match self {
            Self::RequestCreated { key, .. } | Self::ApprovalRecorded { key, .. } => key,
            Self::AccessGranted { record, .. } => &record.key,
        }
    }
}

/// Fan-out of committed workflow events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: WorkflowEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(key = %event.key(), "no subscribers");
                0
            }
        }
    }
}

/// Takes every event buffered for `rx` without waiting.
///
/// Events the receiver lagged past are gone; the gap is logged and draining
/// resumes at the oldest retained event.
pub fn drain(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event receiver lagged, oldest events dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    out
}
