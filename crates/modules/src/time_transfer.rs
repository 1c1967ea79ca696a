//! Time transfer limits - windowed caps on everything a sender moves out
//!
//! Unlike the exchange-scoped modules this one ignores the counterparty:
//! every outgoing transfer of a non-agent sender counts.

use std::sync::{Arc, RwLock};

use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceCall, ComplianceConfig, ComplianceError, ComplianceModule, ComplianceResult,
    ComplianceView, EventKind, ModuleBase, Transfer,
};
use tollgate_core::{Address, Clock};

use crate::counter::{Counter, WindowedCounterStore};
use crate::limits::{Limit, LimitConfigStore, MAX_LIMITS};
use crate::rate_limit::{commit_all, exceeds_any, is_exempt};
use crate::ModuleKind;

/// Counter key: (compliance, sender identity)
type SenderKey = (Address, Address);

/// Up to four `(window, cap)` limits per compliance on outgoing volume
pub struct TimeTransferLimitsModule {
    base: ModuleBase,
    clock: Arc<dyn Clock>,
    limits: RwLock<LimitConfigStore<Address>>,
    counters: RwLock<WindowedCounterStore<SenderKey>>,
}

impl TimeTransferLimitsModule {
    pub fn new(base: ModuleBase, clock: Arc<dyn Clock>) -> Self {
        Self {
            base,
            clock,
            limits: RwLock::new(LimitConfigStore::new(MAX_LIMITS)),
            counters: RwLock::new(WindowedCounterStore::new()),
        }
    }

    /// Limit list capacity per compliance (clamped to [`MAX_LIMITS`])
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

    /// Set or update the cap for a window
    pub fn set_time_transfer_limit(
        &self,
        call: &ComplianceCall<'_>,
        limit: Limit,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        let compliance = call.compliance();

        let mut limits = write_guard(&self.limits, "time transfer limits")?;
        if !limits.accepts(compliance, &limit) {
            let size = limits.limits(compliance).len();
            tracing::warn!(
                compliance = %compliance,
                window = limit.window,
                size,
                "Limit list full"
            );
            return Err(ComplianceError::LimitsArraySizeExceeded {
                compliance: compliance.clone(),
                size,
            });
        }

        self.base.emit(EventKind::TimeTransferLimitUpdated {
            compliance: compliance.clone(),
            window_secs: limit.window,
            limit: limit.cap,
        })?;
        limits
            .set(compliance.clone(), limit)
            .map_err(|full| ComplianceError::LimitsArraySizeExceeded {
                compliance: compliance.clone(),
                size: full.capacity,
            })?;
        Ok(())
    }

    /// Limits configured for a compliance
    pub fn get_time_transfer_limits(&self, compliance: &Address) -> Vec<Limit> {
        read_recover(&self.limits).limits(compliance).to_vec()
    }

    /// Stored counter of an identity for a window
    pub fn get_user_counter(
        &self,
        compliance: &Address,
        identity: &Address,
        window: u64,
    ) -> Counter {
        read_recover(&self.counters).get(&(compliance.clone(), identity.clone()), window)
    }
}

impl ComplianceModule for TimeTransferLimitsModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        ModuleKind::TimeTransfersLimits.into()
    }

    fn check(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> bool {
        if is_exempt(transfer, view) {
            return true;
        }

        let limits = read_recover(&self.limits);
        let limits = limits.limits(view.compliance());
        if limits.is_empty() {
            return true;
        }

        let key = (view.compliance().clone(), view.identity_of(&transfer.from));
        let counters = read_recover(&self.counters);
        !exceeds_any(&counters, &key, limits, transfer.amount, self.clock.now())
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        if transfer.amount.is_zero() || is_exempt(transfer, call.view()) {
            return Ok(());
        }

        let limits = self.get_time_transfer_limits(call.compliance());
        if limits.is_empty() {
            return Ok(());
        }

        let key = (call.compliance().clone(), call.view().identity_of(&transfer.from));
        let mut counters = write_guard(&self.counters, "time transfer counters")?;
        commit_all(&mut counters, &key, &limits, transfer.amount, self.clock.now());
        Ok(())
    }
}
