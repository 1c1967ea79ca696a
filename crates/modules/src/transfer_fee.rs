//! Transfer fees - skims a share of every transfer to a collector
//!
//! The module moves the fee out of the receiver's balance with the ledger's
//! `forced_transfer`, so it must hold the agent role before it can be bound.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceCall, ComplianceError, ComplianceModule, ComplianceResult, ComplianceView,
    EventKind, ModuleBase, Transfer,
};
use tollgate_core::{Address, BPS_DENOMINATOR};

use crate::ModuleKind;

/// Fee configuration of one compliance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Share in basis points (0..=10 000)
    pub rate_bps: u32,
    /// Wallet credited with the fee
    pub collector: Address,
}

pub struct TransferFeesModule {
    base: ModuleBase,
    fees: RwLock<HashMap<Address, Fee>>,
}

impl TransferFeesModule {
    pub fn new(base: ModuleBase) -> Self {
        Self {
            base,
            fees: RwLock::new(HashMap::new()),
        }
    }

    /// Set the fee of the calling compliance
    ///
    /// The collector must be verified on the asset at the time of the call.
    pub fn set_fee(
        &self,
        call: &ComplianceCall<'_>,
        rate_bps: u32,
        collector: &Address,
    ) -> ComplianceResult<()> {
        self.base.only_bound(call)?;
        let compliance = call.compliance();

        if rate_bps > BPS_DENOMINATOR {
            return Err(ComplianceError::FeeRateOutOfRange {
                compliance: compliance.clone(),
                rate: rate_bps,
            });
        }
        if !call.ledger().is_verified(collector) {
            tracing::warn!(
                compliance = %compliance,
                collector = %collector,
                "Fee collector not verified"
            );
            return Err(ComplianceError::CollectorNotVerified {
                compliance: compliance.clone(),
                collector: collector.clone(),
            });
        }

        let mut fees = write_guard(&self.fees, "transfer fees")?;
        self.base.emit(EventKind::FeeUpdated {
            compliance: compliance.clone(),
            rate_bps,
            collector: collector.clone(),
        })?;
        fees.insert(
            compliance.clone(),
            Fee {
                rate_bps,
                collector: collector.clone(),
            },
        );
        Ok(())
    }

    /// Fee configured for a compliance
    pub fn get_fee(&self, compliance: &Address) -> Option<Fee> {
        read_recover(&self.fees).get(compliance).cloned()
    }
}

impl ComplianceModule for TransferFeesModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn name(&self) -> &str {
        ModuleKind::TransferFees.into()
    }

    fn is_plug_and_play(&self) -> bool {
        false
    }

    fn can_bind(&self, view: &ComplianceView<'_>) -> bool {
        view.is_agent(self.address())
    }

    fn check(&self, _transfer: &Transfer, _view: &ComplianceView<'_>) -> bool {
        true
    }

    fn on_transfer(&self, call: &ComplianceCall<'_>, transfer: &Transfer) -> ComplianceResult<()> {
        self.base.only_bound(call)?;

        let Some(fee) = self.get_fee(call.compliance()) else {
            return Ok(());
        };
        if fee.rate_bps == 0 || transfer.from == fee.collector || transfer.to == fee.collector {
            return Ok(());
        }

        let view = call.view();
        if view.identity_of(&transfer.from) == view.identity_of(&transfer.to) {
            return Ok(());
        }

        let amount = transfer.amount.basis_points(fee.rate_bps);
        if amount.is_zero() {
            return Ok(());
        }

        match call
            .ledger()
            .forced_transfer(self.address(), &transfer.to, &fee.collector, amount)
        {
            Ok(()) => tracing::debug!(
                compliance = %call.compliance(),
                payer = %transfer.to,
                collector = %fee.collector,
                fee = %amount,
                "Transfer fee collected"
            ),
            Err(e) => tracing::error!(
                compliance = %call.compliance(),
                payer = %transfer.to,
                fee = %amount,
                error = %e,
                "Transfer fee collection failed"
            ),
        }
        Ok(())
    }
}
