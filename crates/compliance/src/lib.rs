//! Tollgate Compliance - Modular transfer-policy dispatch
//!
//! A [`ModularCompliance`] instance serves one asset and fans every value
//! movement out to its bound policy modules:
//!
//! ```text
//! Transfer / Mint / Burn request
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ can_transfer                │ ← every module's `check` (AND, read-only)
//! │ (veto = nothing moves)      │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ LEDGER SETTLEMENT           │ (external)
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ transferred / created /     │ ← every module's action hook
//! │ destroyed                   │   (bookkeeping, never fails the transfer)
//! └─────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`module::ComplianceModule`] - The capability every policy module implements
//! - [`module::ComplianceCall`] - Proof that a call was issued by a compliance instance
//! - [`host::ModularCompliance`] - Per-asset aggregator and dispatcher
//! - [`journal::EventJournal`] - Append-only JSONL log of admin events
//! - [`config::ComplianceConfig`] - Tunables (module cap, limit capacity, journal path)

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod journal;
pub mod module;
pub mod sync;
pub mod transfer;

#[cfg(test)]
mod testutil;

pub use config::{ComplianceConfig, MAX_TIME_LIMITS};
pub use error::{ComplianceError, ComplianceResult};
pub use event::{ComplianceEvent, EventKind};
pub use host::ModularCompliance;
pub use journal::EventJournal;
pub use module::{ComplianceCall, ComplianceModule, ComplianceView, ModuleBase};
pub use transfer::Transfer;
