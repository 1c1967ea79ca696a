//! Compliance events (written to the event journal)
//!
//! Every administrative state change of a compliance instance or policy
//! module is announced as an event before the change is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;
use tollgate_core::{Address, Amount};
use uuid::Uuid;

/// An event appended to the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "event_type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// Module bound to a compliance instance
    ModuleAdded {
        compliance: Address,
        module: Address,
        name: String,
    },

    /// Module removed from a compliance instance
    ModuleRemoved {
        compliance: Address,
        module: Address,
        name: String,
    },

    /// Asset bound to a compliance instance
    TokenBound { compliance: Address, token: Address },

    /// Asset unbound from a compliance instance
    TokenUnbound { compliance: Address, token: Address },

    /// Module accepted a compliance binding
    ComplianceBound { module: Address, compliance: Address },

    /// Module released a compliance binding
    ComplianceUnbound { module: Address, compliance: Address },

    /// Identity tagged as an exchange
    ExchangeIdAdded { module: Address, exchange_id: Address },

    /// Exchange tag removed
    ExchangeIdRemoved { module: Address, exchange_id: Address },

    /// Monthly cap towards an exchange changed
    ExchangeMonthlyLimitUpdated {
        compliance: Address,
        exchange_id: Address,
        limit: Amount,
    },

    /// Windowed cap towards an exchange changed
    ExchangeLimitUpdated {
        compliance: Address,
        exchange_id: Address,
        window_secs: u64,
        limit: Amount,
    },

    /// Windowed cap on outgoing transfers changed
    TimeTransferLimitUpdated {
        compliance: Address,
        window_secs: u64,
        limit: Amount,
    },

    /// Fee rate or collector changed
    FeeUpdated {
        compliance: Address,
        rate_bps: u32,
        collector: Address,
    },

    /// Supply cap changed
    SupplyLimitSet { compliance: Address, limit: Amount },
}

impl ComplianceEvent {
    /// Stamp a new event with a fresh id and the current time
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Get event ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get event timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Event name in snake_case (e.g. `module_added`)
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl EventKind {
    /// Event name in snake_case
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The compliance instance the event concerns, when it names one
    pub fn compliance(&self) -> Option<&Address> {
        match self {
            EventKind::ModuleAdded { compliance, .. }
            | EventKind::ModuleRemoved { compliance, .. }
            | EventKind::TokenBound { compliance, .. }
            | EventKind::TokenUnbound { compliance, .. }
            | EventKind::ComplianceBound { compliance, .. }
            | EventKind::ComplianceUnbound { compliance, .. }
            | EventKind::ExchangeMonthlyLimitUpdated { compliance, .. }
            | EventKind::ExchangeLimitUpdated { compliance, .. }
            | EventKind::TimeTransferLimitUpdated { compliance, .. }
            | EventKind::FeeUpdated { compliance, .. }
            | EventKind::SupplyLimitSet { compliance, .. } => Some(compliance),
            EventKind::ExchangeIdAdded { .. } | EventKind::ExchangeIdRemoved { .. } => None,
        }
    }
}
