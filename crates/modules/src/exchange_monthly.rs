//! Exchange monthly limits - one rolling cap per exchange on what each
//! investor may deposit into it

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceCall, ComplianceConfig, ComplianceModule, ComplianceResult, ComplianceView,
    EventKind, ModuleBase, Transfer,
};
use tollgate_core::{Address, Amount, Clock, Timestamp};

use crate::counter::{Counter, WindowedCounterStore};
use crate::exchange::ExchangeTagRegistry;
use crate::ModuleKind;

/// Counter key: (compliance, exchange identity, investor identity)
type InvestorKey = (Address, Address, Address);

/// A single `(window, cap)` per (compliance, exchange)
///
/// An exchange without a configured cap is unrestricted.
pub struct ExchangeMonthlyLimitsModule {
    base: ModuleBase,
    clock: Arc<dyn Clock>,
    window: u64,
    exchanges: ExchangeTagRegistry,
    limits: RwLock<HashMap<(Address, Address), Amount>>,
    counters: RwLock<WindowedCounterStore<InvestorKey>>,
}

impl ExchangeMonthlyLimitsModule {
    pub fn new(base: ModuleBase, clock: Arc<dyn Clock>) -> Self {
        Self {
            base,
            clock,
            window: ComplianceConfig::default().monthly_window_secs,
            exchanges: ExchangeTagRegistry::new(),
            limits: RwLock::new(HashMap::new()),
            counters: RwLock::new(WindowedCounterStore::new()),
        }
    }

    /// Override the window length (seconds)
    pub fn with_window(mut self, window_secs: u64) -> Self {
        self.window = window_secs;
        self
    }

    /// Apply the monthly window of a compliance configuration
    pub fn with_config(self, config: &ComplianceConfig) -> Self {
        self.with_window(config.monthly_window_secs)
    }

    /// Window length in seconds
    pub fn window(&self) -> u64 {
        self.window
    }

    // === Exchange tagging (module owner) ===

    pub fn add_exchange_id(
        &self,
        caller: &Address,
        exchange_id: &Address,
    ) -> ComplianceResult<()> {
        self.exchanges.tag(&self.base, caller, exchange_id)
    }

    pub fn remove_exchange_id(
        &self,
        caller: &Address,
        exchange_id: &Address,
    ) -> ComplianceResult<()> {
        self.exchanges.untag(&self.base, caller, exchange_id)
    }

    pub fn is_exchange_id(&self, exchange_id: &Address) -> bool {
        self.exchanges.contains(exchange_id)
    }

    // === Per-compliance configuration ===

    /// Set the cap on deposits into `exchange_id` per investor and window
    pub fn set_exchange_monthly_limit(
        &self,
        call: &ComplianceCall<'_>,
        exchange_id: &Address,
        limit: Amount,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        let compliance = call.compliance();

        let mut limits = write_guard(&self.limits, "exchange monthly limits")?;
        self.base.emit(EventKind::ExchangeMonthlyLimitUpdated {
            compliance: compliance.clone(),
            exchange_id: exchange_id.clone(),
            limit,
        })?;
        limits.insert((compliance.clone(), exchange_id.clone()), limit);
        Ok(())
    }

    /// Cap configured for an exchange
    pub fn get_exchange_monthly_limit(
        &self,
        compliance: &Address,
        exchange_id: &Address,
    ) -> Option<Amount> {
        read_recover(&self.limits)
            .get(&(compliance.clone(), exchange_id.clone()))
            .copied()
    }

    /// Stored amount an investor deposited into an exchange this window
    pub fn get_monthly_counter(
        &self,
        compliance: &Address,
        exchange_id: &Address,
        investor_id: &Address,
    ) -> Amount {
        self.stored(compliance, exchange_id, investor_id).value
    }

    /// End of the investor's current window (0 if never started)
    pub fn get_monthly_timer(
        &self,
        compliance: &Address,
        exchange_id: &Address,
        investor_id: &Address,
    ) -> Timestamp {
        self.stored(compliance, exchange_id, investor_id).expiry
    }

    fn stored(
        &self,
        compliance: &Address,
        exchange_id: &Address,
        investor_id: &Address,
    ) -> Counter {
        let key = (compliance.clone(), exchange_id.clone(), investor_id.clone());
        read_recover(&self.counters).get(&key, self.window)
    }
}

impl ComplianceModule for ExchangeMonthlyLimitsModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        ModuleKind::ExchangeMonthlyLimits.into()
    }

    fn check(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> bool {
        let Some(scope) = self.exchanges.scope(transfer, view) else {
            return true;
        };
        let Some(cap) = self.get_exchange_monthly_limit(view.compliance(), &scope.exchange) else {
            return true;
        };

        let key = (view.compliance().clone(), scope.exchange, scope.sender);
        let counters = read_recover(&self.counters);
        !counters.would_exceed(&key, self.window, cap, transfer.amount, self.clock.now())
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        if transfer.amount.is_zero() {
            return Ok(());
        }
        let Some(scope) = self.exchanges.scope(transfer, call.view()) else {
            return Ok(());
        };

        let key = (call.compliance().clone(), scope.exchange, scope.sender);
        let counter = write_guard(&self.counters, "exchange monthly counters")?.commit(
            key,
            self.window,
            transfer.amount,
            self.clock.now(),
        );
        tracing::debug!(
            compliance = %call.compliance(),
            value = %counter.value,
            expiry = counter.expiry,
            "Monthly counter committed"
        );
        Ok(())
    }
}
