//! ModularCompliance - per-asset aggregator and dispatcher
//!
//! Modules are evaluated in binding order. `can_transfer` requires unanimous
//! approval; the action dispatchers run every module's hook, log failures
//! and keep going, since the movement has already settled.

use std::sync::{Arc, RwLock};

use tollgate_core::{Address, Amount, TokenLedger};
use uuid::Uuid;

use crate::config::ComplianceConfig;
use crate::error::{ComplianceError, ComplianceResult};
use crate::event::{ComplianceEvent, EventKind};
use crate::journal::EventJournal;
use crate::module::{ComplianceCall, ComplianceModule, ComplianceView};
use crate::sync::{read_recover, write_guard};
use crate::transfer::Transfer;

/// A compliance instance serving one asset
///
/// Besides its public address every instance draws a private id at
/// construction. Modules record that id when they are bound and only accept
/// [`ComplianceCall`]s carrying it.
pub struct ModularCompliance {
    address: Address,
    instance: Uuid,
    owner: Address,
    config: ComplianceConfig,
    token: RwLock<Option<Address>>,
    modules: RwLock<Vec<Arc<dyn ComplianceModule>>>,
    journal: Arc<EventJournal>,
}

impl ModularCompliance {
    /// Create an instance with default configuration and an in-memory journal
    pub fn new(address: Address, owner: Address) -> Self {
        Self::with_config(address, owner, ComplianceConfig::default())
    }

    /// Create an instance with the given configuration and an in-memory journal
    pub fn with_config(address: Address, owner: Address, config: ComplianceConfig) -> Self {
        Self {
            address,
            instance: Uuid::new_v4(),
            owner,
            config,
            token: RwLock::new(None),
            modules: RwLock::new(Vec::new()),
            journal: Arc::new(EventJournal::in_memory()),
        }
    }

    /// Create an instance, opening the journal file named by the configuration
    pub fn from_config(
        address: Address,
        owner: Address,
        config: ComplianceConfig,
    ) -> ComplianceResult<Self> {
        let journal = match &config.journal_path {
            Some(path) => Arc::new(EventJournal::new(path)?),
            None => Arc::new(EventJournal::in_memory()),
        };
        Ok(Self::with_config(address, owner, config).with_journal(journal))
    }

    /// Use a shared journal
    pub fn with_journal(mut self, journal: Arc<EventJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Instance address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Instance owner
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Active configuration
    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Event journal (share it with modules to get one ordered log)
    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }

    // === Token binding ===

    /// Record the asset this instance serves
    ///
    /// The owner may always (re)bind; otherwise the asset may bind itself
    /// while no asset is bound.
    pub fn bind_token(&self, caller: &Address, token: &Address) -> ComplianceResult<()> {
        let mut bound = write_guard(&self.token, "bound token")?;
        if caller != &self.owner && !(bound.is_none() && caller == token) {
            return Err(ComplianceError::access_denied(
                caller,
                "the compliance owner or the unbound token",
            ));
        }
        if token.is_zero() {
            return Err(ComplianceError::InvalidTransfer(
                "cannot bind the zero address as token".to_string(),
            ));
        }

        self.emit(EventKind::TokenBound {
            compliance: self.address.clone(),
            token: token.clone(),
        })?;
        *bound = Some(token.clone());

        tracing::info!(compliance = %self.address, token = %token, "Token bound");
        Ok(())
    }

    /// Release the bound asset
    pub fn unbind_token(&self, caller: &Address, token: &Address) -> ComplianceResult<()> {
        let mut bound = write_guard(&self.token, "bound token")?;
        if caller != &self.owner && caller != token {
            return Err(ComplianceError::access_denied(
                caller,
                "the compliance owner or the bound token",
            ));
        }
        if bound.as_ref() != Some(token) {
            return Err(ComplianceError::TokenNotBound(token.clone()));
        }

        self.emit(EventKind::TokenUnbound {
            compliance: self.address.clone(),
            token: token.clone(),
        })?;
        *bound = None;

        tracing::info!(compliance = %self.address, token = %token, "Token unbound");
        Ok(())
    }

    /// The bound asset, if any
    pub fn token_bound(&self) -> Option<Address> {
        read_recover(&self.token).clone()
    }

    // === Module binding ===

    /// Bind a module; binding the same module object again is a no-op
    pub fn add_module(
        &self,
        caller: &Address,
        module: Arc<dyn ComplianceModule>,
        ledger: &dyn TokenLedger,
    ) -> ComplianceResult<()> {
        self.only_owner(caller)?;
        self.ensure_token(ledger)?;

        let mut modules = write_guard(&self.modules, "module list")?;
        if let Some(existing) = modules.iter().find(|m| m.address() == module.address()) {
            if Arc::ptr_eq(existing, &module) {
                tracing::debug!(
                    compliance = %self.address,
                    module = module.name(),
                    "Module already bound"
                );
                return Ok(());
            }
            tracing::warn!(
                compliance = %self.address,
                module = %module.address(),
                "Another module is bound at this address"
            );
            return Err(ComplianceError::ModuleAddressInUse(module.address().clone()));
        }
        if modules.len() >= self.config.max_modules {
            return Err(ComplianceError::ModuleLimitReached(self.config.max_modules));
        }

        let view = ComplianceView::new(&self.address, ledger);
        if !module.is_plug_and_play() && !module.can_bind(&view) {
            tracing::warn!(
                compliance = %self.address,
                module = module.name(),
                "Module refused binding"
            );
            return Err(ComplianceError::IncompatibleModule(module.name().to_string()));
        }

        let call = ComplianceCall::new(view, self.instance);
        module.bind_compliance(&call)?;

        if let Err(e) = self.emit(EventKind::ModuleAdded {
            compliance: self.address.clone(),
            module: module.address().clone(),
            name: module.name().to_string(),
        }) {
            module.base().release(&call);
            return Err(e);
        }

        tracing::info!(
            compliance = %self.address,
            module = module.name(),
            position = modules.len(),
            "Module bound"
        );
        modules.push(module);
        Ok(())
    }

    /// Remove a bound module
    pub fn remove_module(
        &self,
        caller: &Address,
        module: &Address,
        ledger: &dyn TokenLedger,
    ) -> ComplianceResult<()> {
        self.only_owner(caller)?;
        self.ensure_token(ledger)?;

        let mut modules = write_guard(&self.modules, "module list")?;
        let index = modules
            .iter()
            .position(|m| m.address() == module)
            .ok_or_else(|| ComplianceError::ModuleNotBound(module.clone()))?;

        let call = self.call(ledger);
        let target = &modules[index];
        target.unbind_compliance(&call)?;

        if let Err(e) = self.emit(EventKind::ModuleRemoved {
            compliance: self.address.clone(),
            module: target.address().clone(),
            name: target.name().to_string(),
        }) {
            target.base().restore(&call);
            return Err(e);
        }

        let removed = modules.remove(index);
        tracing::info!(compliance = %self.address, module = removed.name(), "Module removed");
        Ok(())
    }

    /// Bound modules in evaluation order
    pub fn modules(&self) -> Vec<Arc<dyn ComplianceModule>> {
        read_recover(&self.modules).clone()
    }

    /// Number of bound modules
    pub fn module_count(&self) -> usize {
        read_recover(&self.modules).len()
    }

    /// Check if a module is bound
    pub fn is_module_bound(&self, module: &Address) -> bool {
        read_recover(&self.modules)
            .iter()
            .any(|m| m.address() == module)
    }

    /// Relay an owner call to a bound module
    ///
    /// `f` receives the [`ComplianceCall`] that per-instance module setters
    /// require.
    ///
    /// # Example
    /// ```ignore
    /// compliance.call_module_function(&owner, &token, &*supply, |call| {
    ///     supply.set_supply_limit(call, Amount::from(1_000))
    /// })?;
    /// ```
    pub fn call_module_function<M, R, F>(
        &self,
        caller: &Address,
        ledger: &dyn TokenLedger,
        module: &M,
        f: F,
    ) -> ComplianceResult<R>
    where
        M: ComplianceModule + ?Sized,
        F: FnOnce(&ComplianceCall<'_>) -> ComplianceResult<R>,
    {
        self.only_owner(caller)?;
        self.ensure_token(ledger)?;
        if !self.holds(module) {
            return Err(ComplianceError::ModuleNotBound(module.address().clone()));
        }

        tracing::debug!(
            compliance = %self.address,
            module = module.name(),
            "Relaying module call"
        );
        let call = self.call(ledger);
        f(&call)
    }

    // === Dispatch ===

    /// Whether every bound module approves the movement
    ///
    /// Read-only; stops at the first veto.
    pub fn can_transfer(&self, transfer: &Transfer, ledger: &dyn TokenLedger) -> bool {
        let view = ComplianceView::new(&self.address, ledger);
        for module in self.modules() {
            if !module.check(transfer, &view) {
                tracing::warn!(
                    compliance = %self.address,
                    module = module.name(),
                    from = %transfer.from,
                    to = %transfer.to,
                    amount = %transfer.amount,
                    "Module vetoed transfer"
                );
                return false;
            }
            tracing::debug!(
                compliance = %self.address,
                module = module.name(),
                "Module check passed"
            );
        }
        true
    }

    /// Run every module's transfer hook after settlement
    pub fn transferred(
        &self,
        ledger: &dyn TokenLedger,
        transfer: &Transfer,
    ) -> ComplianceResult<()> {
        self.ensure_token(ledger)?;
        if transfer.from.is_zero() || transfer.to.is_zero() {
            return Err(ComplianceError::InvalidTransfer(format!(
                "transfer {} -> {} involves the zero address",
                transfer.from, transfer.to
            )));
        }

        let call = self.call(ledger);
        self.dispatch("transfer", |module| module.on_transfer(&call, transfer));
        Ok(())
    }

    /// Run every module's mint hook after issuance
    pub fn created(
        &self,
        ledger: &dyn TokenLedger,
        to: &Address,
        amount: Amount,
    ) -> ComplianceResult<()> {
        self.ensure_token(ledger)?;
        if to.is_zero() {
            return Err(ComplianceError::InvalidTransfer(
                "cannot mint to the zero address".to_string(),
            ));
        }

        let call = self.call(ledger);
        self.dispatch("mint", |module| module.on_mint(&call, to, amount));
        Ok(())
    }

    /// Run every module's burn hook after retirement
    pub fn destroyed(
        &self,
        ledger: &dyn TokenLedger,
        from: &Address,
        amount: Amount,
    ) -> ComplianceResult<()> {
        self.ensure_token(ledger)?;
        if from.is_zero() {
            return Err(ComplianceError::InvalidTransfer(
                "cannot burn from the zero address".to_string(),
            ));
        }

        let call = self.call(ledger);
        self.dispatch("burn", |module| module.on_burn(&call, from, amount));
        Ok(())
    }

    fn dispatch<F>(&self, hook: &str, mut run: F)
    where
        F: FnMut(&dyn ComplianceModule) -> ComplianceResult<()>,
    {
        // Snapshot so hooks run without holding the module lock
        for module in self.modules() {
            match run(module.as_ref()) {
                Ok(()) => {
                    tracing::debug!(
                        compliance = %self.address,
                        module = module.name(),
                        hook,
                        "Action hook completed"
                    );
                }
                Err(e) => {
                    // The movement has settled; a failing hook cannot undo it
                    tracing::error!(
                        compliance = %self.address,
                        module = module.name(),
                        hook,
                        error = %e,
                        "Action hook failed"
                    );
                }
            }
        }
    }

    /// Whether `module` is the very object bound here, not just one at the same address
    fn holds<M: ComplianceModule + ?Sized>(&self, module: &M) -> bool {
        read_recover(&self.modules)
            .iter()
            .any(|m| std::ptr::addr_eq(Arc::as_ptr(m), module as *const M))
    }

    fn call<'a>(&'a self, ledger: &'a dyn TokenLedger) -> ComplianceCall<'a> {
        ComplianceCall::new(ComplianceView::new(&self.address, ledger), self.instance)
    }

    fn only_owner(&self, caller: &Address) -> ComplianceResult<()> {
        if caller == &self.owner {
            Ok(())
        } else {
            tracing::warn!(
                compliance = %self.address,
                caller = %caller,
                "Rejected non-owner call"
            );
            Err(ComplianceError::access_denied(caller, "the compliance owner"))
        }
    }

    fn ensure_token(&self, ledger: &dyn TokenLedger) -> ComplianceResult<()> {
        match read_recover(&self.token).as_ref() {
            None => Err(ComplianceError::TokenNotBound(self.address.clone())),
            Some(token) if token == ledger.address() => Ok(()),
            Some(_) => Err(ComplianceError::access_denied(
                ledger.address(),
                "the bound token",
            )),
        }
    }

    fn emit(&self, kind: EventKind) -> ComplianceResult<()> {
        self.journal.append(&ComplianceEvent::new(kind))
    }
}

impl std::fmt::Debug for ModularCompliance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModularCompliance")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("token", &self.token_bound())
            .field("modules", &self.module_count())
            .finish()
    }
}
