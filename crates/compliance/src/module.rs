//! Module capability - the interface every policy module implements
//!
//! Checks are read-only and callable by anyone through a [`ComplianceView`].
//! Action hooks and per-instance setters take a [`ComplianceCall`], which only
//! a [`ModularCompliance`](crate::host::ModularCompliance) can issue. The call
//! carries the issuing instance's private id next to its address, and a module
//! accepts it only if that exact instance bound it. Another instance that
//! reuses the address is rejected.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tollgate_core::{Address, Amount, TokenLedger};
use uuid::Uuid;

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::{ComplianceEvent, EventKind};
use crate::journal::EventJournal;
use crate::sync::{read_recover, write_guard};
use crate::transfer::Transfer;

/// Read-only context a check runs in: which instance is asking, over which asset
#[derive(Clone, Copy)]
pub struct ComplianceView<'a> {
    compliance: &'a Address,
    ledger: &'a dyn TokenLedger,
}

impl<'a> ComplianceView<'a> {
    pub fn new(compliance: &'a Address, ledger: &'a dyn TokenLedger) -> Self {
        Self { compliance, ledger }
    }

    /// The compliance instance
    pub fn compliance(&self) -> &'a Address {
        self.compliance
    }

    /// The asset the instance serves
    pub fn ledger(&self) -> &'a dyn TokenLedger {
        self.ledger
    }

    /// Identity of a wallet, or the wallet itself when unregistered
    pub fn identity_of(&self, wallet: &Address) -> Address {
        self.ledger.identity_or_wallet(wallet)
    }

    /// Whether the account is an agent of the asset
    pub fn is_agent(&self, account: &Address) -> bool {
        self.ledger.is_agent(account)
    }
}

impl fmt::Debug for ComplianceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplianceView")
            .field("compliance", self.compliance)
            .field("token", self.ledger.address())
            .finish()
    }
}

/// Capability proving that a call was issued by a compliance instance
#[derive(Debug, Clone, Copy)]
pub struct ComplianceCall<'a> {
    view: ComplianceView<'a>,
    instance: Uuid,
}

impl<'a> ComplianceCall<'a> {
    pub(crate) fn new(view: ComplianceView<'a>, instance: Uuid) -> Self {
        Self { view, instance }
    }

    /// Private id of the issuing instance
    pub(crate) fn instance(&self) -> Uuid {
        self.instance
    }

    /// Read-only view of the issuing instance
    pub fn view(&self) -> &ComplianceView<'a> {
        &self.view
    }

    /// The issuing compliance instance
    pub fn compliance(&self) -> &'a Address {
        self.view.compliance()
    }

    /// The asset the issuing instance serves
    pub fn ledger(&self) -> &'a dyn TokenLedger {
        self.view.ledger()
    }
}

/// State every module carries: ownership, bindings and the event sink
///
/// Bindings map a compliance address to the private id of the instance that
/// bound it.
#[derive(Debug)]
pub struct ModuleBase {
    owner: Address,
    address: Address,
    bound: RwLock<HashMap<Address, Uuid>>,
    journal: Arc<EventJournal>,
}

impl ModuleBase {
    pub fn new(owner: Address, address: Address, journal: Arc<EventJournal>) -> Self {
        Self {
            owner,
            address,
            bound: RwLock::new(HashMap::new()),
            journal,
        }
    }

    /// Module owner (authorized for exchange tagging)
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Module address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Event journal shared with the compliance instances
    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }

    /// Accept a binding from the calling instance
    pub fn bind(&self, call: &ComplianceCall<'_>) -> ComplianceResult<()> {
        let compliance = call.compliance();
        let mut bound = write_guard(&self.bound, "module bindings")?;
        if bound.contains_key(compliance) {
            return Err(ComplianceError::AlreadyInitialized {
                module: self.address.clone(),
                compliance: compliance.clone(),
            });
        }

        self.emit(EventKind::ComplianceBound {
            module: self.address.clone(),
            compliance: compliance.clone(),
        })?;
        bound.insert(compliance.clone(), call.instance());
        Ok(())
    }

    /// Release the binding of the calling instance
    pub fn unbind(&self, call: &ComplianceCall<'_>) -> ComplianceResult<()> {
        let compliance = call.compliance();
        let mut bound = write_guard(&self.bound, "module bindings")?;
        if bound.get(compliance) != Some(&call.instance()) {
            return Err(self.not_bound(compliance));
        }

        self.emit(EventKind::ComplianceUnbound {
            module: self.address.clone(),
            compliance: compliance.clone(),
        })?;
        bound.remove(compliance);
        Ok(())
    }

    /// Drop a binding without announcing it (rollback of a half-finished bind)
    pub(crate) fn release(&self, call: &ComplianceCall<'_>) {
        let mut bound = self.bound.write().unwrap_or_else(PoisonError::into_inner);
        if bound.get(call.compliance()) == Some(&call.instance()) {
            bound.remove(call.compliance());
        }
    }

    /// Reinstate a binding without announcing it (rollback of a half-finished unbind)
    pub(crate) fn restore(&self, call: &ComplianceCall<'_>) {
        self.bound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(call.compliance().clone(), call.instance());
    }

    /// Check if a compliance address is bound to this module
    pub fn is_bound(&self, compliance: &Address) -> bool {
        read_recover(&self.bound).contains_key(compliance)
    }

    /// Reject calls relayed by an instance this module is not bound to
    pub fn only_bound(&self, call: &ComplianceCall<'_>) -> ComplianceResult<()> {
        let issued_by_binder =
            read_recover(&self.bound).get(call.compliance()) == Some(&call.instance());
        if issued_by_binder {
            Ok(())
        } else {
            Err(self.not_bound(call.compliance()))
        }
    }

    /// Reject callers other than the module owner
    pub fn only_owner(&self, caller: &Address) -> ComplianceResult<()> {
        if caller == &self.owner {
            Ok(())
        } else {
            tracing::warn!(module = %self.address, caller = %caller, "Rejected non-owner call");
            Err(ComplianceError::access_denied(caller, "the module owner"))
        }
    }

    /// Append an event to the journal
    pub fn emit(&self, kind: EventKind) -> ComplianceResult<()> {
        self.journal.append(&ComplianceEvent::new(kind))
    }

    fn not_bound(&self, compliance: &Address) -> ComplianceError {
        tracing::warn!(
            module = %self.address,
            compliance = %compliance,
            "Rejected call from unbound compliance"
        );
        ComplianceError::access_denied(
            compliance,
            format!("a compliance bound to {}", self.address),
        )
    }
}

/// A policy module
///
/// Implementors provide `check` and the action hooks; binding bookkeeping
/// comes from [`ModuleBase`]. Every hook must start with
/// [`ModuleBase::only_bound`] and must be a no-op when its rule does not
/// apply to the movement.
pub trait ComplianceModule: Send + Sync {
    /// Shared module state
    fn base(&self) -> &ModuleBase;

    /// Module name for logging/debugging
    fn name(&self) -> &str;

    /// Module address
    fn address(&self) -> &Address {
        self.base().address()
    }

    /// Module owner
    fn owner(&self) -> &Address {
        self.base().owner()
    }

    /// Whether any instance may bind this module without further checks
    fn is_plug_and_play(&self) -> bool {
        true
    }

    /// Whether the instance in `view` may bind this module
    fn can_bind(&self, _view: &ComplianceView<'_>) -> bool {
        self.is_plug_and_play()
    }

    /// Called by the instance while binding this module
    fn bind_compliance(&self, call: &ComplianceCall<'_>) -> ComplianceResult<()> {
        self.base().bind(call)
    }

    /// Called by the instance while removing this module
    fn unbind_compliance(&self, call: &ComplianceCall<'_>) -> ComplianceResult<()> {
        self.base().unbind(call)
    }

    /// Check if the instance is bound to this module
    fn is_compliance_bound(&self, compliance: &Address) -> bool {
        self.base().is_bound(compliance)
    }

    /// Read-only verdict on a proposed movement
    fn check(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> bool;

    /// Bookkeeping after a settled transfer
    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer)
        -> ComplianceResult<()>;

    /// Bookkeeping after a settled issuance
    fn on_mint(
        &self,
        call: &ComplianceCall<'_>,
        _to: &Address,
        _amount: Amount,
    ) -> ComplianceResult<()> {
        self.base().only_bound(call)
    }

    /// Bookkeeping after a settled retirement
    fn on_burn(
        &self,
        call: &ComplianceCall<'_>,
        _from: &Address,
        _amount: Amount,
    ) -> ComplianceResult<()> {
        self.base().only_bound(call)
    }
}
