//! MemoryToken - in-memory asset ledger wired to a compliance instance
//!
//! Every policy-gated movement runs the same sequence under one settlement
//! lock:
//!
//! 1. `can_transfer` on the compliance instance (a veto moves nothing)
//! 2. balances settle
//! 3. the compliance action hooks run (`transferred` / `created` / `destroyed`)
//!
//! `forced_transfer` skips both compliance steps. It is what modules use for
//! follow-up movements, so an action hook never re-enters dispatch.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};

use tollgate_compliance::sync::read_recover;
use tollgate_compliance::{ComplianceResult, ModularCompliance, Transfer};
use tollgate_core::{Address, Amount, LedgerError, LedgerResult, TokenLedger};

use crate::identity::IdentityRegistry;

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl Book {
    fn balance(&self, wallet: &Address) -> Amount {
        self.balances.get(wallet).copied().unwrap_or_default()
    }

    fn debit(&mut self, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        let available = self.balance(wallet);
        let remaining = available
            .checked_sub(&amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: wallet.clone(),
                available,
                requested: amount,
            })?;
        self.balances.insert(wallet.clone(), remaining);
        Ok(())
    }

    fn credit(&mut self, wallet: &Address, amount: Amount) -> LedgerResult<()> {
        let updated = self
            .balance(wallet)
            .checked_add(&amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        self.balances.insert(wallet.clone(), updated);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.debit(from, amount)?;
        if let Err(e) = self.credit(to, amount) {
            // Restore the debit; credit only fails on overflow
            let restored = self.balance(from).saturating_add(&amount);
            self.balances.insert(from.clone(), restored);
            return Err(e);
        }
        Ok(())
    }
}

/// An asset with balances, agents and an identity registry
pub struct MemoryToken {
    address: Address,
    compliance: Arc<ModularCompliance>,
    identities: IdentityRegistry,
    agents: RwLock<HashSet<Address>>,
    book: RwLock<Book>,
    settlement: Mutex<()>,
}

impl MemoryToken {
    /// Create a token; the compliance instance is not bound yet
    pub fn new(address: Address, compliance: Arc<ModularCompliance>) -> Self {
        Self {
            address,
            compliance,
            identities: IdentityRegistry::new(),
            agents: RwLock::new(HashSet::new()),
            book: RwLock::new(Book::default()),
            settlement: Mutex::new(()),
        }
    }

    /// Create a token and bind it to its compliance instance
    pub fn deploy(
        address: Address,
        compliance: Arc<ModularCompliance>,
    ) -> ComplianceResult<Self> {
        let token = Self::new(address, compliance);
        token.compliance.bind_token(&token.address, &token.address)?;
        Ok(token)
    }

    pub fn compliance(&self) -> &Arc<ModularCompliance> {
        &self.compliance
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    /// Grant the agent role
    pub fn add_agent(&self, agent: Address) {
        tracing::info!(token = %self.address, agent = %agent, "Agent added");
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent);
    }

    /// Revoke the agent role
    pub fn remove_agent(&self, agent: &Address) -> bool {
        tracing::info!(token = %self.address, agent = %agent, "Agent removed");
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent)
    }

    /// Move `amount` from `from` to `to`, subject to compliance
    pub fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let _settlement = self.settle_lock();

        if !self.identities.is_verified(to) {
            return Err(LedgerError::ReceiverNotVerified(to.clone()));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                available,
                requested: amount,
            });
        }

        let transfer = Transfer::new(from.clone(), to.clone(), amount);
        self.gate(&transfer)?;

        self.write_book().transfer(from, to, amount)?;
        tracing::debug!(
            token = %self.address,
            from = %from,
            to = %to,
            amount = %amount,
            "Transfer settled"
        );

        if let Err(e) = self.compliance.transferred(self, &transfer) {
            tracing::error!(token = %self.address, error = %e, "Transfer dispatch failed");
        }
        Ok(())
    }

    /// Issue `amount` to `to`; `operator` must be an agent
    pub fn mint(&self, operator: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.only_agent(operator)?;
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let _settlement = self.settle_lock();

        if !self.identities.is_verified(to) {
            return Err(LedgerError::ReceiverNotVerified(to.clone()));
        }

        self.gate(&Transfer::mint(to.clone(), amount))?;

        {
            let mut book = self.write_book();
            let supply = book
                .total_supply
                .checked_add(&amount)
                .ok_or(LedgerError::SupplyOverflow)?;
            book.credit(to, amount)?;
            book.total_supply = supply;
        }
        tracing::debug!(token = %self.address, to = %to, amount = %amount, "Mint settled");

        if let Err(e) = self.compliance.created(self, to, amount) {
            tracing::error!(token = %self.address, error = %e, "Mint dispatch failed");
        }
        Ok(())
    }

    /// Retire `amount` held by `from`; `operator` must be an agent
    pub fn burn(&self, operator: &Address, from: &Address, amount: Amount) -> LedgerResult<()> {
        self.only_agent(operator)?;
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let _settlement = self.settle_lock();

        self.gate(&Transfer::burn(from.clone(), amount))?;

        {
            let mut book = self.write_book();
            book.debit(from, amount)?;
            book.total_supply = book
                .total_supply
                .checked_sub(&amount)
                .unwrap_or(Amount::ZERO);
        }
        tracing::debug!(token = %self.address, from = %from, amount = %amount, "Burn settled");

        if let Err(e) = self.compliance.destroyed(self, from, amount) {
            tracing::error!(token = %self.address, error = %e, "Burn dispatch failed");
        }
        Ok(())
    }

    fn gate(&self, transfer: &Transfer) -> LedgerResult<()> {
        if self.compliance.token_bound().as_ref() != Some(&self.address) {
            return Err(LedgerError::Compliance(format!(
                "token {} is not bound to compliance {}",
                self.address,
                self.compliance.address()
            )));
        }
        if !self.compliance.can_transfer(transfer, self) {
            return Err(LedgerError::ComplianceRejected {
                from: transfer.from.clone(),
                to: transfer.to.clone(),
                amount: transfer.amount,
            });
        }
        Ok(())
    }

    fn only_agent(&self, operator: &Address) -> LedgerResult<()> {
        if self.is_agent(operator) {
            Ok(())
        } else {
            Err(LedgerError::NotAnAgent(operator.clone()))
        }
    }

    fn settle_lock(&self) -> MutexGuard<'_, ()> {
        self.settlement.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_book(&self) -> RwLockWriteGuard<'_, Book> {
        self.book.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenLedger for MemoryToken {
    fn address(&self) -> &Address {
        &self.address
    }

    fn identity_of(&self, wallet: &Address) -> Option<Address> {
        self.identities.identity(wallet)
    }

    fn is_verified(&self, wallet: &Address) -> bool {
        self.identities.is_verified(wallet)
    }

    fn is_agent(&self, account: &Address) -> bool {
        read_recover(&self.agents).contains(account)
    }

    fn balance_of(&self, wallet: &Address) -> Amount {
        read_recover(&self.book).balance(wallet)
    }

    fn total_supply(&self) -> Amount {
        read_recover(&self.book).total_supply
    }

    fn forced_transfer(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.only_agent(operator)?;
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        self.write_book().transfer(from, to, amount)?;
        tracing::debug!(
            token = %self.address,
            operator = %operator,
            from = %from,
            to = %to,
            amount = %amount,
            "Forced transfer settled"
        );
        Ok(())
    }
}

impl std::fmt::Debug for MemoryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryToken")
            .field("address", &self.address)
            .field("compliance", self.compliance.address())
            .field("total_supply", &self.total_supply())
            .finish()
    }
}
