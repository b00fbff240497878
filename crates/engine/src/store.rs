//! Keyed record store with per-key versioned compare-and-swap.
//!
//! Each `(resource, applicant)` key owns exactly one [`KeySlot`]. Writers
//! read a [`Versioned`] slot, compute the next slot, and swap it in only if
//! the version is unchanged.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use quorum_core::{KeySlot, QuorumResult, RequestKey};

/// A slot together with the version it was read at.
///
/// Version 0 means nothing has ever been written for the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versioned {
    pub version: u64,
    pub slot: KeySlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Swapped { version: u64 },
    /// Someone else wrote first; nothing was changed.
    Conflict { actual: u64 },
}

/// Storage contract the engine needs from a backing record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self, key: &RequestKey) -> QuorumResult<Versioned>;

    /// Replaces the slot for `key` iff its version is still `expected`.
    async fn compare_and_swap(
        &self,
        key: &RequestKey,
        expected: u64,
        next: KeySlot,
    ) -> QuorumResult<CasOutcome>;

    /// Snapshot of every written key, ordered by key.
    async fn entries(&self) -> QuorumResult<Vec<(RequestKey, KeySlot)>>;
}

/// In-process store. `DashMap` shards keep unrelated keys from contending.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<RequestKey, Versioned>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, key: &RequestKey) -> QuorumResult<Versioned> {
        Ok(self
            .slots
            .get(key)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }

    async fn compare_and_swap(
        &self,
        key: &RequestKey,
        expected: u64,
        next: KeySlot,
    ) -> QuorumResult<CasOutcome> {
        match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().version;
                if current != expected {
                    return Ok(CasOutcome::Conflict { actual: current });
                }
                let version = current + 1;
                occupied.insert(Versioned {
                    version,
                    slot: next,
                });
                Ok(CasOutcome::Swapped { version })
            }
            Entry::Vacant(vacant) => {
                if expected != 0 {
                    return Ok(CasOutcome::Conflict { actual: 0 });
                }
                vacant.insert(Versioned {
                    version: 1,
                    slot: next,
                });
                Ok(CasOutcome::Swapped { version: 1 })
            }
        }
    }

    async fn entries(&self) -> QuorumResult<Vec<(RequestKey, KeySlot)>> {
        let mut entries: Vec<(RequestKey, KeySlot)> = self
            .slots
            .iter()
            .map(|e| (e.key().clone(), e.value().slot.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
