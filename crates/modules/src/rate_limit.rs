//! Shared rate-limit evaluation for the windowed modules

use std::hash::Hash;

use tollgate_compliance::{ComplianceView, Transfer};
use tollgate_core::{Amount, Timestamp};

use crate::counter::WindowedCounterStore;
use crate::limits::Limit;

/// Issuance, retirement and agent-originated transfers are never rate-limited
pub(crate) fn is_exempt(transfer: &Transfer, view: &ComplianceView<'_>) -> bool {
    transfer.is_mint() || transfer.is_burn() || view.is_agent(&transfer.from)
}

/// Whether `amount` would overflow any of `limits` for `key`
pub(crate) fn exceeds_any<K: Eq + Hash + Clone>(
    counters: &WindowedCounterStore<K>,
    key: &K,
    limits: &[Limit],
    amount: Amount,
    now: Timestamp,
) -> bool {
    limits
        .iter()
        .any(|limit| counters.would_exceed(key, limit.window, limit.cap, amount, now))
}

/// Add `amount` to the counter of every window in `limits`
pub(crate) fn commit_all<K: Eq + Hash + Clone>(
    counters: &mut WindowedCounterStore<K>,
    key: &K,
    limits: &[Limit],
    amount: Amount,
    now: Timestamp,
) {
    for limit in limits {
        let counter = counters.commit(key.clone(), limit.window, amount, now);
        tracing::debug!(
            window = limit.window,
            value = %counter.value,
            expiry = counter.expiry,
            "Counter committed"
        );
    }
}
