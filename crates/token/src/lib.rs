//! Tollgate Token - reference asset ledger
//!
//! An in-memory asset that drives a [`ModularCompliance`] the way a real
//! ledger would: check, settle, then dispatch the action hooks. It also
//! implements [`TokenLedger`] so modules can read balances, identities and
//! agents, and move fees with `forced_transfer`.
//!
//! [`ModularCompliance`]: tollgate_compliance::ModularCompliance
//! [`TokenLedger`]: tollgate_core::TokenLedger

pub mod identity;
pub mod token;

pub use identity::IdentityRegistry;
pub use token::MemoryToken;
