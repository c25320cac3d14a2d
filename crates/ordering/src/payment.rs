//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use thiserror::Error;

/// Errors from the payment gateway.
///
/// Settlement runs detached after commit; these errors are logged and
/// counted, never propagated to the order's caller, and never revert a
/// committed order.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The gateway rejected the settlement request.
    #[error("Settlement rejected: {0}")]
    Rejected(String),
}

/// Result of a successful settlement dispatch.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// The settlement ID assigned by the payment provider.
    pub settlement_id: String,
}

/// Trait for payment settlement operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Captures or confirms payment of `amount_cents` for a placed order.
    ///
    /// The amount is the order total frozen at placement time; the gateway
    /// must never re-derive it from live catalog prices.
    async fn settle(
        &self,
        order_id: OrderId,
        amount_cents: i64,
        paid_with_cash: bool,
    ) -> Result<SettlementResult, SettlementError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    settlements: HashMap<String, (OrderId, i64)>,
    next_id: u32,
    fail_on_settle: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next settle call.
    pub fn set_fail_on_settle(&self, fail: bool) {
        self.state.write().unwrap().fail_on_settle = fail;
    }

    /// Returns the number of recorded settlements.
    pub fn settlement_count(&self) -> usize {
        self.state.read().unwrap().settlements.len()
    }

    /// Returns true if some settlement was dispatched for the given order.
    pub fn has_settlement_for(&self, order_id: OrderId) -> bool {
        self.settled_amount_for(order_id).is_some()
    }

    /// The amount settled for the given order, when a settlement exists.
    pub fn settled_amount_for(&self, order_id: OrderId) -> Option<i64> {
        self.state
            .read()
            .unwrap()
            .settlements
            .values()
            .find(|(id, _)| *id == order_id)
            .map(|&(_, amount)| amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn settle(
        &self,
        order_id: OrderId,
        amount_cents: i64,
        _paid_with_cash: bool,
    ) -> Result<SettlementResult, SettlementError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_settle {
            return Err(SettlementError::Rejected("Payment declined".to_string()));
        }

        state.next_id += 1;
        let settlement_id = format!("PAY-{:04}", state.next_id);
        state
            .settlements
            .insert(settlement_id.clone(), (order_id, amount_cents));

        Ok(SettlementResult { settlement_id })
    }
}
