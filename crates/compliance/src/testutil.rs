//! Test doubles shared by the unit tests of this crate

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tollgate_core::{Address, Amount, LedgerError, LedgerResult, TokenLedger};

use crate::error::ComplianceResult;
use crate::journal::EventJournal;
use crate::module::{ComplianceCall, ComplianceModule, ComplianceView, ModuleBase};
use crate::transfer::Transfer;

pub fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

/// Ledger with fixed identities and agents and no balances
pub struct StubLedger {
    address: Address,
    identities: HashMap<Address, Address>,
    agents: HashSet<Address>,
}

impl StubLedger {
    pub fn new(address: &str) -> Self {
        Self {
            address: addr(address),
            identities: HashMap::new(),
            agents: HashSet::new(),
        }
    }

    pub fn with_identity(mut self, wallet: &str, identity: &str) -> Self {
        self.identities.insert(addr(wallet), addr(identity));
        self
    }

    pub fn with_agent(mut self, agent: &str) -> Self {
        self.agents.insert(addr(agent));
        self
    }
}

impl TokenLedger for StubLedger {
    fn address(&self) -> &Address {
        &self.address
    }

    fn identity_of(&self, wallet: &Address) -> Option<Address> {
        self.identities.get(wallet).cloned()
    }

    fn is_verified(&self, wallet: &Address) -> bool {
        self.identities.contains_key(wallet)
    }

    fn is_agent(&self, account: &Address) -> bool {
        self.agents.contains(account)
    }

    fn balance_of(&self, _wallet: &Address) -> Amount {
        Amount::ZERO
    }

    fn total_supply(&self) -> Amount {
        Amount::ZERO
    }

    fn forced_transfer(
        &self,
        operator: &Address,
        _from: &Address,
        _to: &Address,
        _amount: Amount,
    ) -> LedgerResult<()> {
        Err(LedgerError::NotAnAgent(operator.clone()))
    }
}

/// Module that records every hook call and vetoes on demand
pub struct RecordingModule {
    base: ModuleBase,
    name: String,
    veto: AtomicBool,
    plug_and_play: bool,
    calls: Mutex<Vec<String>>,
}

impl RecordingModule {
    pub fn new(name: &str) -> Self {
        Self::with_journal(name, Arc::new(EventJournal::in_memory()))
    }

    pub fn with_journal(name: &str, journal: Arc<EventJournal>) -> Self {
        Self {
            base: ModuleBase::new(addr("owner"), addr(name), journal),
            name: name.to_string(),
            veto: AtomicBool::new(false),
            plug_and_play: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn incompatible(mut self) -> Self {
        self.plug_and_play = false;
        self
    }

    pub fn set_veto(&self, veto: bool) {
        self.veto.store(veto, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ComplianceModule for RecordingModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_plug_and_play(&self) -> bool {
        self.plug_and_play
    }

    fn check(&self, _transfer: &Transfer, _view: &ComplianceView<'_>) -> bool {
        !self.veto.load(Ordering::SeqCst)
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        self.record(format!("transfer:{}->{}:{}", transfer.from, transfer.to, transfer.amount));
        Ok(())
    }

    fn on_mint(
        &self,
        call: &ComplianceCall<'_>,
        to: &Address,
        amount: Amount,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        self.record(format!("mint:{}:{}", to, amount));
        Ok(())
    }

    fn on_burn(
        &self,
        call: &ComplianceCall<'_>,
        from: &Address,
        amount: Amount,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        self.record(format!("burn:{}:{}", from, amount));
        Ok(())
    }
}
