//! Bounded limit lists keyed by window duration
//!
//! Each scope holds at most [`MAX_LIMITS`] `(window, cap)` entries with unique
//! windows. Setting a known window updates its cap in place; a new window is
//! appended only while there is room.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_core::Amount;

pub use tollgate_compliance::MAX_TIME_LIMITS as MAX_LIMITS;

/// A cap on the amount moved within a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    /// Window duration in seconds
    pub window: u64,
    pub cap: Amount,
}

impl Limit {
    pub fn new(window: u64, cap: Amount) -> Self {
        Self { window, cap }
    }
}

/// Outcome of [`LimitSet::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitChange {
    /// Existing window, cap replaced
    Updated { index: usize, previous: Amount },
    /// New window appended
    Inserted { index: usize },
}

/// A new window was rejected because the list is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Limit list is full ({capacity} entries)")]
pub struct LimitSetFull {
    pub capacity: usize,
}

/// Ordered limits of one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitSet {
    entries: Vec<Limit>,
    capacity: usize,
}

impl Default for LimitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LimitSet {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LIMITS)
    }

    /// Capacity is clamped to [`MAX_LIMITS`]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_LIMITS);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Update the cap of a known window, or append a new window
    pub fn set(&mut self, limit: Limit) -> Result<LimitChange, LimitSetFull> {
        if let Some(index) = self.position(limit.window) {
            let previous = self.entries[index].cap;
            self.entries[index].cap = limit.cap;
            return Ok(LimitChange::Updated { index, previous });
        }

        if self.entries.len() >= self.capacity {
            return Err(LimitSetFull {
                capacity: self.capacity,
            });
        }

        self.entries.push(limit);
        Ok(LimitChange::Inserted {
            index: self.entries.len() - 1,
        })
    }

    /// Whether [`LimitSet::set`] would succeed
    pub fn accepts(&self, limit: &Limit) -> bool {
        self.position(limit.window).is_some() || self.entries.len() < self.capacity
    }

    /// Limit configured for a window
    pub fn get(&self, window: u64) -> Option<Limit> {
        self.position(window).map(|i| self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Limit> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Limit] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn position(&self, window: u64) -> Option<usize> {
        self.entries.iter().position(|l| l.window == window)
    }
}

/// Limit lists for many scopes sharing one capacity
#[derive(Debug, Clone)]
pub struct LimitConfigStore<S> {
    sets: HashMap<S, LimitSet>,
    capacity: usize,
}

impl<S> Default for LimitConfigStore<S> {
    fn default() -> Self {
        Self {
            sets: HashMap::new(),
            capacity: MAX_LIMITS,
        }
    }
}

impl<S: Eq + Hash> LimitConfigStore<S> {
    /// Capacity is clamped to [`MAX_LIMITS`]
    pub fn new(capacity: usize) -> Self {
        Self {
            sets: HashMap::new(),
            capacity: capacity.min(MAX_LIMITS),
        }
    }

    pub fn set(&mut self, scope: S, limit: Limit) -> Result<LimitChange, LimitSetFull> {
        let capacity = self.capacity;
        self.sets
            .entry(scope)
            .or_insert_with(|| LimitSet::with_capacity(capacity))
            .set(limit)
    }

    pub fn accepts(&self, scope: &S, limit: &Limit) -> bool {
        match self.sets.get(scope) {
            Some(set) => set.accepts(limit),
            None => self.capacity > 0,
        }
    }

    /// Limits of a scope in insertion order (empty if none set)
    pub fn limits(&self, scope: &S) -> &[Limit] {
        self.sets.get(scope).map(LimitSet::as_slice).unwrap_or(&[])
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
