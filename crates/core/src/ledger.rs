//! Ledger collaborator interface
//!
//! The asset ledger and identity registry are external to the policy engine.
//! Modules only see them through [`TokenLedger`], which deliberately exposes
//! no policy-gated transfer: the one mutation on offer, `forced_transfer`,
//! settles without re-entering compliance dispatch.

use thiserror::Error;

use crate::address::Address;
use crate::amount::Amount;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("{0} is not an agent of the asset")]
    NotAnAgent(Address),

    #[error("Receiver {0} is not a verified identity")]
    ReceiverNotVerified(Address),

    #[error("Transfer of {amount} from {from} to {to} rejected by compliance")]
    ComplianceRejected {
        from: Address,
        to: Address,
        amount: Amount,
    },

    #[error("Compliance dispatch failed: {0}")]
    Compliance(String),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Total supply overflow")]
    SupplyOverflow,
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The view of the asset ledger available to compliance and its modules
pub trait TokenLedger: Send + Sync {
    /// Address of the asset itself
    fn address(&self) -> &Address;

    /// Identity registered for a wallet, if any
    fn identity_of(&self, wallet: &Address) -> Option<Address>;

    /// Whether the wallet belongs to a verified identity
    fn is_verified(&self, wallet: &Address) -> bool;

    /// Whether the account holds the asset's agent role
    fn is_agent(&self, account: &Address) -> bool;

    /// Current balance of a wallet
    fn balance_of(&self, wallet: &Address) -> Amount;

    /// Current total supply
    fn total_supply(&self) -> Amount;

    /// Move value between wallets without compliance dispatch.
    ///
    /// Only agents may call this; `operator` is checked with [`TokenLedger::is_agent`].
    fn forced_transfer(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;

    /// Identity for a wallet, falling back to the wallet itself when unregistered
    fn identity_or_wallet(&self, wallet: &Address) -> Address {
        self.identity_of(wallet).unwrap_or_else(|| wallet.clone())
    }
}
