//! Exchange tagging shared by the exchange-scoped modules

use std::collections::HashSet;
use std::sync::RwLock;

use tollgate_compliance::sync::{read_recover, write_guard};
use tollgate_compliance::{
    ComplianceError, ComplianceResult, ComplianceView, EventKind, ModuleBase, Transfer,
};
use tollgate_core::Address;

use crate::rate_limit::is_exempt;

/// Identities a module treats as exchange counterparties
///
/// Mutated only by the module owner. An identity is tagged at most once.
#[derive(Debug, Default)]
pub struct ExchangeTagRegistry {
    tags: RwLock<HashSet<Address>>,
}

/// Parties of a transfer an exchange limit applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeScope {
    /// Receiver identity (tagged as exchange)
    pub exchange: Address,
    /// Sender identity
    pub sender: Address,
}

impl ExchangeTagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag an identity as exchange
    pub fn tag(
        &self,
        base: &ModuleBase,
        caller: &Address,
        exchange_id: &Address,
    ) -> ComplianceResult<()> {
        base.only_owner(caller)?;

        let mut tags = write_guard(&self.tags, "exchange tags")?;
        if tags.contains(exchange_id) {
            return Err(ComplianceError::AlreadyTagged(exchange_id.clone()));
        }

        base.emit(EventKind::ExchangeIdAdded {
            module: base.address().clone(),
            exchange_id: exchange_id.clone(),
        })?;
        tags.insert(exchange_id.clone());

        tracing::info!(
            module = %base.address(),
            exchange_id = %exchange_id,
            "Exchange tagged"
        );
        Ok(())
    }

    /// Remove an exchange tag
    pub fn untag(
        &self,
        base: &ModuleBase,
        caller: &Address,
        exchange_id: &Address,
    ) -> ComplianceResult<()> {
        base.only_owner(caller)?;

        let mut tags = write_guard(&self.tags, "exchange tags")?;
        if !tags.contains(exchange_id) {
            return Err(ComplianceError::NotTagged(exchange_id.clone()));
        }

        base.emit(EventKind::ExchangeIdRemoved {
            module: base.address().clone(),
            exchange_id: exchange_id.clone(),
        })?;
        tags.remove(exchange_id);

        tracing::info!(
            module = %base.address(),
            exchange_id = %exchange_id,
            "Exchange untagged"
        );
        Ok(())
    }

    /// Check if an identity is tagged
    pub fn contains(&self, id: &Address) -> bool {
        read_recover(&self.tags).contains(id)
    }

    /// Number of tagged identities
    pub fn len(&self) -> usize {
        read_recover(&self.tags).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve who an exchange limit applies to, or `None` when it does not apply
    ///
    /// Limits apply to every transfer from a non-agent sender into an identity
    /// tagged as exchange. A sender that is itself tagged is still counted.
    pub fn scope(&self, transfer: &Transfer, view: &ComplianceView<'_>) -> Option<ExchangeScope> {
        if is_exempt(transfer, view) {
            return None;
        }

        let exchange = view.identity_of(&transfer.to);
        let sender = view.identity_of(&transfer.from);
        if !read_recover(&self.tags).contains(&exchange) {
            return None;
        }

        Some(ExchangeScope { exchange, sender })
    }
}
