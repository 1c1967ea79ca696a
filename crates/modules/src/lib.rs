//! Tollgate Modules - policy modules for modular compliance
//!
//! Building blocks:
//! - [`counter::WindowedCounterStore`]: reset-on-expiry counters per (scope, window)
//! - [`limits::LimitConfigStore`]: up to four `(window, cap)` limits per scope
//! - [`exchange::ExchangeTagRegistry`]: identities tagged as exchange counterparties
//!
//! Modules:
//! - [`ExchangeMonthlyLimitsModule`]: one rolling cap per exchange and investor
//! - [`TimeExchangeLimitsModule`]: up to four windowed caps per exchange and investor
//! - [`TimeTransferLimitsModule`]: up to four windowed caps on all outgoing volume
//! - [`SupplyLimitModule`]: cap on total supply at issuance
//! - [`TransferFeesModule`]: basis-point fee moved from receiver to a collector

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub mod counter;
pub mod exchange;
pub mod exchange_monthly;
pub mod limits;
mod rate_limit;
pub mod supply_limit;
pub mod time_exchange;
pub mod time_transfer;
pub mod transfer_fee;

pub use counter::{Counter, WindowedCounterStore};
pub use exchange::{ExchangeScope, ExchangeTagRegistry};
pub use exchange_monthly::ExchangeMonthlyLimitsModule;
pub use limits::{Limit, LimitChange, LimitConfigStore, LimitSet, LimitSetFull, MAX_LIMITS};
pub use supply_limit::SupplyLimitModule;
pub use time_exchange::TimeExchangeLimitsModule;
pub use time_transfer::TimeTransferLimitsModule;
pub use transfer_fee::{Fee, TransferFeesModule};

/// Module kinds; the snake_case spelling is each module's `name()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ModuleKind {
    ExchangeMonthlyLimits,
    TimeExchangeLimits,
    TimeTransfersLimits,
    SupplyLimit,
    TransferFees,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_module_kind_names() {
        let names: Vec<String> = ModuleKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "exchange_monthly_limits",
                "time_exchange_limits",
                "time_transfers_limits",
                "supply_limit",
                "transfer_fees",
            ]
        );

        assert_eq!(
            ModuleKind::from_str("transfer_fees").unwrap(),
            ModuleKind::TransferFees
        );
        assert!(ModuleKind::from_str("unknown").is_err());

        let name: &'static str = ModuleKind::SupplyLimit.into();
        assert_eq!(name, "supply_limit");
    }
}
