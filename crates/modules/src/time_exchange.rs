//! Time exchange limits - up to four windowed caps per exchange on what
//! each investor may deposit into it

use std::sync::{Arc, RwLock};

use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceCall, ComplianceConfig, ComplianceError, ComplianceModule, ComplianceResult,
    ComplianceView, EventKind, ModuleBase, Transfer,
};
use tollgate_core::{Address, Clock};

use crate::counter::{Counter, WindowedCounterStore};
use crate::exchange::ExchangeTagRegistry;
use crate::limits::{Limit, LimitConfigStore, MAX_LIMITS};
use crate::rate_limit::{commit_all, exceeds_any};
use crate::ModuleKind;

/// Limit scope: (compliance, exchange identity)
type ExchangeKey = (Address, Address);

/// Counter key: (compliance, exchange identity, investor identity)
type InvestorKey = (Address, Address, Address);

/// Windowed caps per (compliance, exchange); every window must pass
pub struct TimeExchangeLimitsModule {
    base: ModuleBase,
    clock: Arc<dyn Clock>,
    exchanges: ExchangeTagRegistry,
    limits: RwLock<LimitConfigStore<ExchangeKey>>,
    counters: RwLock<WindowedCounterStore<InvestorKey>>,
}

impl TimeExchangeLimitsModule {
    pub fn new(base: ModuleBase, clock: Arc<dyn Clock>) -> Self {
        Self {
            base,
            clock,
            exchanges: ExchangeTagRegistry::new(),
            limits: RwLock::new(LimitConfigStore::new(MAX_LIMITS)),
            counters: RwLock::new(WindowedCounterStore::new()),
        }
    }

    /// Limit list capacity per exchange (clamped to [`MAX_LIMITS`])
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self {
            limits: RwLock::new(LimitConfigStore::new(capacity)),
            ..self
        }
    }

    /// Apply the limit capacity of a compliance configuration
    pub fn with_config(self, config: &ComplianceConfig) -> Self {
        self.with_capacity(config.time_limit_capacity())
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

    /// Set or update the cap for a window on deposits into `exchange_id`
    pub fn set_exchange_limit(
        &self,
        call: &ComplianceCall<'_>,
        exchange_id: &Address,
        limit: Limit,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        let compliance = call.compliance();
        let scope = (compliance.clone(), exchange_id.clone());

        let mut limits = write_guard(&self.limits, "time exchange limits")?;
        if !limits.accepts(&scope, &limit) {
            let size = limits.limits(&scope).len();
            tracing::warn!(
                compliance = %compliance,
                exchange_id = %exchange_id,
                window = limit.window,
                size,
                "Limit list full"
            );
            return Err(ComplianceError::LimitsArraySizeExceeded {
                compliance: compliance.clone(),
                size,
            });
        }

        self.base.emit(EventKind::ExchangeLimitUpdated {
            compliance: compliance.clone(),
            exchange_id: exchange_id.clone(),
            window_secs: limit.window,
            limit: limit.cap,
        })?;
        limits
            .set(scope, limit)
            .map_err(|full| ComplianceError::LimitsArraySizeExceeded {
                compliance: compliance.clone(),
                size: full.capacity,
            })?;
        Ok(())
    }

    /// Limits configured for an exchange
    pub fn get_exchange_limits(&self, compliance: &Address, exchange_id: &Address) -> Vec<Limit> {
        read_recover(&self.limits)
            .limits(&(compliance.clone(), exchange_id.clone()))
            .to_vec()
    }

    /// Stored counter of an investor towards an exchange for a window
    pub fn get_exchange_counter(
        &self,
        compliance: &Address,
        exchange_id: &Address,
        investor_id: &Address,
        window: u64,
    ) -> Counter {
        let key = (compliance.clone(), exchange_id.clone(), investor_id.clone());
        read_recover(&self.counters).get(&key, window)
    }
}

impl ComplianceModule for TimeExchangeLimitsModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        ModuleKind::TimeExchangeLimits.into()
    }

    fn check(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> bool {
        let Some(scope) = self.exchanges.scope(transfer, view) else {
            return true;
        };

        let limits = read_recover(&self.limits);
        let limits = limits.limits(&(view.compliance().clone(), scope.exchange.clone()));
        if limits.is_empty() {
            return true;
        }

        let key = (view.compliance().clone(), scope.exchange, scope.sender);
        let counters = read_recover(&self.counters);
        !exceeds_any(&counters, &key, limits, transfer.amount, self.clock.now())
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        if transfer.amount.is_zero() {
            return Ok(());
        }
        let Some(scope) = self.exchanges.scope(transfer, call.view()) else {
            return Ok(());
        };

        let limits = self.get_exchange_limits(call.compliance(), &scope.exchange);
        if limits.is_empty() {
            return Ok(());
        }

        let key = (call.compliance().clone(), scope.exchange, scope.sender);
        let mut counters = write_guard(&self.counters, "time exchange counters")?;
        commit_all(&mut counters, &key, &limits, transfer.amount, self.clock.now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_compliance::{EventJournal, ModularCompliance};
    use tollgate_core::{Amount, ManualClock};
    use tollgate_token::MemoryToken;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    struct Fixture {
        compliance: Arc<ModularCompliance>,
        token: MemoryToken,
        module: Arc<TimeExchangeLimitsModule>,
        clock: Arc<ManualClock>,
    }

    fn setup() -> Fixture {
        let compliance = Arc::new(ModularCompliance::new(addr("compliance-1"), addr("owner")));
        let token = MemoryToken::deploy(addr("token-1"), compliance.clone()).unwrap();
        token.identities().register(addr("alice-wallet"), addr("alice"));
        token.identities().register(addr("venue-wallet"), addr("venue"));

        let clock = Arc::new(ManualClock::new(1_000));
        let base = ModuleBase::new(
            addr("owner"),
            addr("time-exchange"),
            Arc::new(EventJournal::in_memory()),
        );
        let module = Arc::new(TimeExchangeLimitsModule::new(base, clock.clone()));
        compliance
            .add_module(&addr("owner"), module.clone(), &token)
            .unwrap();
        module.add_exchange_id(&addr("owner"), &addr("venue")).unwrap();

        Fixture {
            compliance,
            token,
            module,
            clock,
        }
    }

    fn set_limit(f: &Fixture, window: u64, cap: u64) -> ComplianceResult<()> {
        f.compliance
            .call_module_function(&addr("owner"), &f.token, &*f.module, |call| {
                f.module.set_exchange_limit(
                    call,
                    &addr("venue"),
                    Limit::new(window, Amount::from(cap)),
                )
            })
    }

    fn deposit(amount: u64) -> Transfer {
        Transfer::new(addr("alice-wallet"), addr("venue-wallet"), Amount::from(amount))
    }

    #[test]
    fn test_all_windows_must_pass() {
        let f = setup();
        set_limit(&f, 10, 100).unwrap();
        set_limit(&f, 100, 150).unwrap();
        let view = ComplianceView::new(f.compliance.address(), &f.token);

        f.compliance.transferred(&f.token, &deposit(90)).unwrap();

        let compliance = f.compliance.address();
        let short = f
            .module
            .get_exchange_counter(compliance, &addr("venue"), &addr("alice"), 10);
        let long = f
            .module
            .get_exchange_counter(compliance, &addr("venue"), &addr("alice"), 100);
        assert_eq!(short.value, Amount::from(90));
        assert_eq!(short.expiry, 1_010);
        assert_eq!(long.expiry, 1_100);

        // short window reset, long window still holds 90
        f.clock.advance(10);
        assert!(f.module.check(&deposit(60), &view));
        assert!(!f.module.check(&deposit(61), &view));
    }

    #[test]
    fn test_limits_are_per_exchange() {
        let f = setup();
        set_limit(&f, 10, 100).unwrap();

        assert_eq!(
            f.module
                .get_exchange_limits(f.compliance.address(), &addr("venue")),
            vec![Limit::new(10, Amount::from(100))]
        );
        assert!(f
            .module
            .get_exchange_limits(f.compliance.address(), &addr("other"))
            .is_empty());
    }

    #[test]
    fn test_fifth_window_rejected() {
        let f = setup();
        for window in [10, 20, 30, 40] {
            set_limit(&f, window, 100).unwrap();
        }

        let err = set_limit(&f, 50, 100).unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::LimitsArraySizeExceeded { size: 4, .. }
        ));
        assert_eq!(
            f.module
                .get_exchange_limits(f.compliance.address(), &addr("venue"))
                .len(),
            4
        );
    }

    #[test]
    fn test_limit_event_emitted() {
        let f = setup();
        set_limit(&f, 10, 100).unwrap();

        let events = f.module.base().journal().read_all().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.name(), "exchange_limit_updated");
        assert_eq!(
            last.kind,
            EventKind::ExchangeLimitUpdated {
                compliance: addr("compliance-1"),
                exchange_id: addr("venue"),
                window_secs: 10,
                limit: Amount::from(100),
            }
        );
    }
}
