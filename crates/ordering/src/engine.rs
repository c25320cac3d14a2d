//! The order placement engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog::store::validate_new_order;
use catalog::{CatalogError, CatalogStore, NewOrder, OrderReceipt};
use common::OrderId;

use crate::error::PlaceOrderError;
use crate::payment::PaymentGateway;

/// How many times one placement request drives the store transaction
/// before a transient conflict is surfaced to the caller.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; doubles after each conflict.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Drives transactional order placement against a catalog store.
///
/// The engine holds no stock state and takes no in-process locks: the
/// store's transaction mechanism is the only exclusion over stock, so any
/// number of engine instances (or service processes) can run concurrently.
pub struct PlacementEngine<S, P> {
    store: S,
    gateway: Arc<P>,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl<S, P> PlacementEngine<S, P>
where
    S: CatalogStore,
    P: PaymentGateway + 'static,
{
    /// Creates an engine over the given store and payment gateway.
    pub fn new(store: S, gateway: P) -> Self {
        Self {
            store,
            gateway: Arc::new(gateway),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Overrides the transient-conflict retry policy.
    pub fn with_retry_policy(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    /// Places an order: the whole cart succeeds or the whole cart fails.
    ///
    /// Transient conflicts re-run the entire store transaction from its
    /// row-locked read, not just the write, up to the configured attempt
    /// bound. Every attempt is a single transaction that either commits
    /// fully or leaves no trace, so a retried cart can never produce two
    /// orders.
    ///
    /// On success a settlement request is handed to the payment gateway on
    /// a detached task, strictly after commit: its outcome is not awaited
    /// here and cannot roll the order back.
    #[tracing::instrument(
        skip(self, order),
        fields(customer_id = %order.customer_id, lines = order.lines.len())
    )]
    pub async fn place_order(&self, order: NewOrder) -> Result<OrderId, PlaceOrderError> {
        validate_new_order(&order).map_err(PlaceOrderError::InvalidCart)?;

        let started = Instant::now();
        let mut attempt = 1;
        let OrderReceipt {
            order_id,
            total_cents,
        } = loop {
            match self.store.place_order(order.clone()).await {
                Ok(receipt) => break receipt,
                Err(CatalogError::TransientConflict) if attempt < self.max_attempts => {
                    metrics::counter!("orders_placement_retries").increment(1);
                    tracing::warn!(attempt, "transient conflict, retrying placement");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    metrics::counter!("orders_placement_failed").increment(1);
                    if !matches!(
                        e,
                        CatalogError::ProductNotFound(_)
                            | CatalogError::InsufficientStock(_)
                            | CatalogError::TransientConflict
                    ) {
                        // Store detail stays server-side; callers see an
                        // opaque internal error.
                        tracing::error!(error = %e, "order placement failed in the catalog store");
                    }
                    return Err(e.into());
                }
            }
        };

        metrics::counter!("orders_placed").increment(1);
        metrics::histogram!("orders_placement_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, total_cents, attempts = attempt, "order committed");

        self.dispatch_settlement(order_id, total_cents, order.paid_with_cash);
        Ok(order_id)
    }

    /// Fire-and-forget settlement handoff. Runs outside any transaction;
    /// failures are logged and counted, never propagated. The amount is
    /// the total from the placement receipt, not a re-read of prices.
    fn dispatch_settlement(&self, order_id: OrderId, amount_cents: i64, paid_with_cash: bool) {
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            match gateway.settle(order_id, amount_cents, paid_with_cash).await {
                Ok(result) => {
                    metrics::counter!("settlements_dispatched").increment(1);
                    tracing::info!(
                        %order_id,
                        amount_cents,
                        settlement_id = %result.settlement_id,
                        "settlement dispatched"
                    );
                }
                Err(e) => {
                    // The order is already final; reconciliation of failed
                    // settlements happens outside this core.
                    metrics::counter!("settlements_failed").increment(1);
                    tracing::error!(%order_id, error = %e, "settlement failed after commit");
                }
            }
        });
    }
}
