//! Supply limit - caps total supply on issuance

use std::collections::HashMap;
use std::sync::RwLock;

use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceCall, ComplianceModule, ComplianceResult, ComplianceView, EventKind, ModuleBase,
    Transfer,
};
use tollgate_core::{Address, Amount};

use crate::ModuleKind;

/// Vetoes any issuance that would take total supply above the cap
///
/// Only `check` enforces the cap; the action hooks have nothing to record.
pub struct SupplyLimitModule {
    base: ModuleBase,
    limits: RwLock<HashMap<Address, Amount>>,
}

impl SupplyLimitModule {
    pub fn new(base: ModuleBase) -> Self {
        Self {
            base,
            limits: RwLock::new(HashMap::new()),
        }
    }

    /// Set the supply cap of the calling compliance
    pub fn set_supply_limit(
        &self,
        call: &ComplianceCall<'_>,
        limit: Amount,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        let compliance = call.compliance();

        let mut limits = write_guard(&self.limits, "supply limits")?;
        self.base.emit(EventKind::SupplyLimitSet {
            compliance: compliance.clone(),
            limit,
        })?;
        limits.insert(compliance.clone(), limit);

        tracing::info!(compliance = %compliance, limit = %limit, "Supply limit set");
        Ok(())
    }

    /// Cap configured for a compliance (`None` means unlimited)
    pub fn get_supply_limit(&self, compliance: &Address) -> Option<Amount> {
        read_recover(&self.limits).get(compliance).copied()
    }
}

impl ComplianceModule for SupplyLimitModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        ModuleKind::SupplyLimit.into()
    }

    fn check(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> bool {
        if !transfer.is_mint() {
            return true;
        }
        let Some(limit) = self.get_supply_limit(view.compliance()) else {
            return true;
        };

        match view.ledger().total_supply().checked_add(&transfer.amount) {
            Some(prospective) => prospective <= limit,
            None => false,
        }
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, _transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tollgate_compliance::{ComplianceError, EventJournal, ModularCompliance};
    use tollgate_token::MemoryToken;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn setup() -> (Arc<ModularCompliance>, MemoryToken, Arc<SupplyLimitModule>) {
        let compliance = Arc::new(ModularCompliance::new(addr("compliance-1"), addr("owner")));
        let token = MemoryToken::deploy(addr("token-1"), compliance.clone()).unwrap();
        token.identities().register(addr("alice-wallet"), addr("alice"));

        let journal = Arc::new(EventJournal::in_memory());
        let base = ModuleBase::new(addr("owner"), addr("supply"), journal);
        let module = Arc::new(SupplyLimitModule::new(base));
        compliance
            .add_module(&addr("owner"), module.clone(), &token)
            .unwrap();
        (compliance, token, module)
    }

    #[test]
    fn test_transfers_are_never_capped() {
        let (compliance, token, module) = setup();
        compliance
            .call_module_function(&addr("owner"), &token, &*module, |call| {
                module.set_supply_limit(call, Amount::ZERO)
            })
            .unwrap();

        let view = ComplianceView::new(compliance.address(), &token);
        let plain = Transfer::new(addr("alice-wallet"), addr("bob"), Amount::from(10));
        assert!(module.check(&plain, &view));

        let mint = Transfer::mint(addr("alice-wallet"), Amount::from(1));
        assert!(!module.check(&mint, &view));
    }

    #[test]
    fn test_unset_limit_is_unlimited() {
        let (compliance, token, module) = setup();
        let view = ComplianceView::new(compliance.address(), &token);

        assert!(module.get_supply_limit(compliance.address()).is_none());
        assert!(module.check(&Transfer::mint(addr("alice-wallet"), Amount::MAX), &view));
    }

    #[test]
    fn test_setter_needs_bound_compliance() {
        let (_, _, module) = setup();
        let other = Arc::new(ModularCompliance::new(addr("compliance-2"), addr("owner")));
        let other_token = MemoryToken::deploy(addr("token-2"), other.clone()).unwrap();

        let err = other
            .call_module_function(&addr("owner"), &other_token, &*module, |call| {
                module.set_supply_limit(call, Amount::from(5))
            })
            .unwrap_err();
        assert!(matches!(err, ComplianceError::ModuleNotBound(_)));
        assert!(module.get_supply_limit(other.address()).is_none());
    }
}
