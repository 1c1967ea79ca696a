//! Lock helpers shared by compliance instances and modules
//!
//! Reads on the check path must never fail, so a poisoned lock is recovered
//! for reading. Writes surface poisoning as [`ComplianceError::LockPoisoned`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ComplianceError, ComplianceResult};

/// Acquire a read guard, recovering the data from a poisoned lock
pub fn read_recover<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Acquire a write guard; `what` names the protected state in the error
pub fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    what: &str,
) -> ComplianceResult<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| ComplianceError::LockPoisoned(what.to_string()))
}
