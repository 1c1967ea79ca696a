//! Tollgate Core - Domain types
//!
//! This crate contains the fundamental types shared by the policy engine:
//! - `Address`: wallets, identities, modules and compliance instances
//! - `Amount`: Non-negative decimal wrapper for token amounts
//! - `Clock`: Time source for windowed limits
//! - `TokenLedger`: The narrow ledger interface policy modules consume

pub mod address;
pub mod amount;
pub mod clock;
pub mod ledger;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError, BPS_DENOMINATOR};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use ledger::{LedgerError, LedgerResult, TokenLedger};
