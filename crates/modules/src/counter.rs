//! Windowed counters with reset-on-expiry
//!
//! A counter accumulates amounts for one scope key and one window duration.
//! Once `now >= expiry` (or the counter never started, `expiry == 0`) it is
//! treated as `{0, now + window}` for both checking and committing.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tollgate_core::{Amount, Timestamp};

/// Accumulated value and the end of its window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub value: Amount,
    pub expiry: Timestamp,
}

impl Counter {
    /// Whether the window has ended (or never started)
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry == 0 || now >= self.expiry
    }

    /// The counter as seen at `now`, reset if its window has ended
    pub fn effective(&self, window: u64, now: Timestamp) -> Counter {
        if self.is_expired(now) {
            Counter {
                value: Amount::ZERO,
                expiry: now.saturating_add(window),
            }
        } else {
            *self
        }
    }
}

/// Counters keyed by (scope, window duration)
///
/// Counters are created lazily on first commit and never deleted.
#[derive(Debug, Clone)]
pub struct WindowedCounterStore<K> {
    counters: HashMap<(K, u64), Counter>,
}

impl<K> Default for WindowedCounterStore<K> {
    fn default() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> WindowedCounterStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored counter, untouched by expiry (zero if never committed)
    pub fn get(&self, key: &K, window: u64) -> Counter {
        self.counters
            .get(&(key.clone(), window))
            .copied()
            .unwrap_or_default()
    }

    /// Counter as seen at `now`
    pub fn effective(&self, key: &K, window: u64, now: Timestamp) -> Counter {
        self.get(key, window).effective(window, now)
    }

    /// Whether adding `amount` at `now` would take the counter above `cap`
    pub fn would_exceed(
        &self,
        key: &K,
        window: u64,
        cap: Amount,
        amount: Amount,
        now: Timestamp,
    ) -> bool {
        match self.effective(key, window, now).value.checked_add(&amount) {
            Some(candidate) => candidate > cap,
            None => true,
        }
    }

    /// Add `amount` at `now`, resetting first if the window has ended
    pub fn commit(&mut self, key: K, window: u64, amount: Amount, now: Timestamp) -> Counter {
        let effective = self.effective(&key, window, now);
        let updated = Counter {
            value: effective.value.saturating_add(&amount),
            expiry: effective.expiry,
        };
        self.counters.insert((key, window), updated);
        updated
    }

    /// Number of counters ever started
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u64 = 10;

    fn amt(units: u64) -> Amount {
        Amount::from(units)
    }

    #[test]
    fn test_fresh_counter_is_expired() {
        let counter = Counter::default();
        assert!(counter.is_expired(0));
        assert!(counter.is_expired(1_000));

        let effective = counter.effective(W, 1_000);
        assert_eq!(effective.value, Amount::ZERO);
        assert_eq!(effective.expiry, 1_010);
    }

    #[test]
    fn test_accumulation_within_window() {
        let mut store = WindowedCounterStore::new();
        let t0 = 1_000;

        for (step, amount) in [30, 40, 50].into_iter().enumerate() {
            let now = t0 + step as u64;
            assert!(!store.would_exceed(&"alice", W, amt(120), amt(amount), now));
            store.commit("alice", W, amt(amount), now);
        }

        let counter = store.get(&"alice", W);
        assert_eq!(counter.value, amt(120));
        assert_eq!(counter.expiry, t0 + W);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_exceeding_cap_detected() {
        let mut store = WindowedCounterStore::new();
        store.commit("alice", W, amt(100), 1_000);

        assert!(store.would_exceed(&"alice", W, amt(120), amt(100), 1_001));
        assert!(!store.would_exceed(&"alice", W, amt(120), amt(20), 1_001));
        // check never mutates
        assert_eq!(store.get(&"alice", W).value, amt(100));
    }

    #[test]
    fn test_reset_on_expiry() {
        let mut store = WindowedCounterStore::new();
        store.commit("alice", W, amt(100), 1_000);

        // now == expiry counts as expired
        assert!(!store.would_exceed(&"alice", W, amt(120), amt(100), 1_010));

        let counter = store.commit("alice", W, amt(100), 1_011);
        assert_eq!(counter.value, amt(100));
        assert_eq!(counter.expiry, 1_021);
    }

    #[test]
    fn test_windows_and_keys_are_independent() {
        let mut store = WindowedCounterStore::new();
        store.commit("alice", 10, amt(5), 1_000);
        store.commit("alice", 60, amt(7), 1_000);
        store.commit("bob", 10, amt(9), 1_000);

        assert_eq!(store.get(&"alice", 10).value, amt(5));
        assert_eq!(store.get(&"alice", 60).value, amt(7));
        assert_eq!(store.get(&"bob", 10).value, amt(9));
        assert_eq!(store.get(&"carol", 10), Counter::default());
    }

    #[test]
    fn test_overflow_counts_as_exceeding() {
        let mut store = WindowedCounterStore::new();
        store.commit("whale", W, Amount::MAX, 1_000);
        assert!(store.would_exceed(&"whale", W, Amount::MAX, amt(1), 1_001));
    }
}
