//! Conditional, key-scoped atomic update with bounded retry.
//!
//! Every write in the engine goes through [`update_slot`]: request creation,
//! approval merging, and the grant transition. The step closure sees the
//! current slot and either rejects (nothing is written) or returns the next
//! slot. A lost compare-and-swap reruns the step against fresh state.

use crate::store::{CasOutcome, RecordStore};
use quorum_core::{KeySlot, QuorumError, QuorumResult, RequestKey};

/// Applies `step` to the slot for `key` atomically.
///
/// Makes at most `max_retries + 1` attempts. Business errors from `step`
/// return immediately; exhausting the attempts yields
/// [`QuorumError::ConcurrentConflict`].
pub async fn update_slot<S, T, F>(
    store: &S,
    key: &RequestKey,
    max_retries: u32,
    mut step: F,
) -> QuorumResult<T>
where
    S: RecordStore + ?Sized,
    F: FnMut(&KeySlot) -> QuorumResult<(KeySlot, T)>,
{
    let attempts = max_retries.saturating_add(1);

    for attempt in 1..=attempts {
        let current = store.load(key).await?;
        let (next, output) = step(&current.slot)?;

        match store.compare_and_swap(key, current.version, next).await? {
            CasOutcome::Swapped { version } => {
                tracing::trace!(%key, version, attempt, "slot updated");
                return Ok(output);
            }
            CasOutcome::Conflict { actual } => {
                tracing::debug!(
                    %key,
                    expected = current.version,
                    actual,
                    attempt,
                    "lost compare-and-swap, retrying"
                );
                tokio::task::yield_now().await;
            }
        }
    }

    tracing::warn!(%key, attempts, "retry budget exhausted");
    Err(QuorumError::ConcurrentConflict {
        key: key.clone(),
        attempts,
    })
}
