//! Identity registry - wallet to verified identity

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tollgate_compliance::sync::read_recover;
use tollgate_core::Address;

/// Wallets mapped to the identity that owns them
///
/// A wallet is verified exactly when it is registered. One identity may own
/// several wallets.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    wallets: RwLock<HashMap<Address, Address>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a wallet under an identity
    pub fn register(&self, wallet: Address, identity: Address) {
        tracing::debug!(wallet = %wallet, identity = %identity, "Wallet registered");
        self.wallets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(wallet, identity);
    }

    /// Remove a wallet, returning the identity it belonged to
    pub fn remove(&self, wallet: &Address) -> Option<Address> {
        self.wallets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(wallet)
    }

    /// Identity owning a wallet
    pub fn identity(&self, wallet: &Address) -> Option<Address> {
        read_recover(&self.wallets).get(wallet).cloned()
    }

    /// Check if a wallet is registered
    pub fn is_verified(&self, wallet: &Address) -> bool {
        read_recover(&self.wallets).contains_key(wallet)
    }
}
