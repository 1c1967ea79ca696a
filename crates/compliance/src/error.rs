//! Compliance errors

use thiserror::Error;
use tollgate_core::{Address, LedgerError};

/// Errors from compliance instances and policy modules
///
/// `check` never produces these: a business-rule violation is a `false`
/// veto, not an error. They are raised only by mutating calls, and a failing
/// call leaves all state untouched.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Access denied: {caller} is not {expected}")]
    AccessDenied { caller: Address, expected: String },

    #[error("Identity {0} is already tagged as an exchange")]
    AlreadyTagged(Address),

    #[error("Identity {0} is not tagged as an exchange")]
    NotTagged(Address),

    #[error("Fee rate {rate} bps is out of range for compliance {compliance}")]
    FeeRateOutOfRange { compliance: Address, rate: u32 },

    #[error("Fee collector {collector} is not verified for compliance {compliance}")]
    CollectorNotVerified {
        compliance: Address,
        collector: Address,
    },

    #[error("Limits array size exceeded for compliance {compliance}: already {size} entries")]
    LimitsArraySizeExceeded { compliance: Address, size: usize },

    #[error("Module {0} is not compatible with this compliance")]
    IncompatibleModule(String),

    #[error("Module {module} is already initialized for compliance {compliance}")]
    AlreadyInitialized { module: Address, compliance: Address },

    #[error("Module {0} is not bound")]
    ModuleNotBound(Address),

    #[error("A different module is already bound at {0}")]
    ModuleAddressInUse(Address),

    #[error("Cannot bind more than {0} modules")]
    ModuleLimitReached(usize),

    #[error("No token bound to compliance {0}")]
    TokenNotBound(Address),

    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;

impl ComplianceError {
    /// Create an access-denied error
    pub fn access_denied(caller: &Address, expected: impl Into<String>) -> Self {
        ComplianceError::AccessDenied {
            caller: caller.clone(),
            expected: expected.into(),
        }
    }

    /// Check if this is an access-control rejection
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ComplianceError::AccessDenied { .. })
    }
}
