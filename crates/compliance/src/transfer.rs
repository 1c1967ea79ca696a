//! Transfer - The value movement every module judges

use serde::Serialize;
use tollgate_core::{Address, Amount};

/// A proposed or settled movement of the asset
///
/// Issuance has the zero address as `from`; retirement has it as `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

impl Transfer {
    /// A transfer between two wallets
    pub fn new(from: Address, to: Address, amount: Amount) -> Self {
        Self { from, to, amount }
    }

    /// Issuance of `amount` to `to`
    pub fn mint(to: Address, amount: Amount) -> Self {
        Self::new(Address::zero(), to, amount)
    }

    /// Retirement of `amount` held by `from`
    pub fn burn(from: Address, amount: Amount) -> Self {
        Self::new(from, Address::zero(), amount)
    }

    /// Check if this is an issuance
    pub fn is_mint(&self) -> bool {
        self.from.is_zero()
    }

    /// Check if this is a retirement
    pub fn is_burn(&self) -> bool {
        self.to.is_zero()
    }
}
