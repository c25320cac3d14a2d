//! The catalog store trait.

use async_trait::async_trait;
use common::{CustomerId, ProductId};

use crate::order::{NewOrder, OrderReceipt, PlacedOrder};
use crate::product::{Product, ProductSummary};
use crate::search::ProductFilter;
use crate::{CatalogError, Result};

/// Core trait for catalog store implementations.
///
/// The store owns all mutual exclusion over stock: callers may run from
/// multiple service instances at once, so no in-process lock can protect
/// the numbers — only the store's own transaction mechanism can.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Atomically validates and commits a purchase.
    ///
    /// Inside one serializable transaction: loads stock and price for the
    /// requested non-deleted products, rejects the whole cart on any
    /// missing product or short stock, otherwise decrements stock,
    /// inserts the order with price-snapshotted lines, and commits.
    ///
    /// There is no partial purchase: any failure rolls the transaction
    /// back with zero visible side effects. Isolation conflicts and
    /// lock/statement timeouts surface as
    /// [`CatalogError::TransientConflict`] and are safe to retry.
    ///
    /// The returned receipt carries the order's total in cents so callers
    /// (settlement in particular) never have to re-read prices that may
    /// have changed since the commit.
    async fn place_order(&self, order: NewOrder) -> Result<OrderReceipt>;

    /// Runs a parameterized, read-only product search.
    ///
    /// Soft-deleted products never appear in results.
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<ProductSummary>>;

    /// Fetches a product by id.
    ///
    /// Returns `None` for missing and soft-deleted products alike.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches a customer's orders, newest first, with their lines joined
    /// against current product names.
    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<PlacedOrder>>;
}

/// Validates a purchase request before it reaches any transaction.
///
/// Shape-level checks only; existence and stock sufficiency are checked
/// inside the store transaction.
pub fn validate_new_order(order: &NewOrder) -> std::result::Result<(), String> {
    if order.lines.is_empty() {
        return Err("order must contain at least one line".to_string());
    }
    let mut seen = std::collections::HashSet::new();
    for line in &order.lines {
        if line.quantity == 0 {
            return Err(format!(
                "quantity for product {} must be positive",
                line.product_id
            ));
        }
        // The order_lines column is a 32-bit integer; anything larger is
        // nonsense for a cart anyway.
        if line.quantity > i32::MAX as u32 {
            return Err(format!(
                "quantity for product {} exceeds the supported maximum",
                line.product_id
            ));
        }
        if !seen.insert(line.product_id) {
            return Err(format!(
                "product {} appears more than once in the order",
                line.product_id
            ));
        }
    }
    Ok(())
}

/// Extension trait providing convenience methods for catalog stores.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Fetches a product, failing with [`CatalogError::ProductNotFound`]
    /// when it is missing or soft-deleted.
    async fn require_product(&self, id: ProductId) -> Result<Product> {
        self.get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    /// Current stock for a product, when it exists and is not soft-deleted.
    async fn stock_of(&self, id: ProductId) -> Result<Option<i64>> {
        Ok(self.get_product(id).await?.map(|p| p.stock))
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NewOrderLine;

    fn order_with_lines(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            customer_id: CustomerId::new(),
            lines,
            delivery_address: "somewhere".to_string(),
            paid_with_cash: false,
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let order = order_with_lines(vec![]);
        assert!(validate_new_order(&order).is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let order = order_with_lines(vec![
            NewOrderLine::new(ProductId::new(), 2),
            NewOrderLine::new(ProductId::new(), 0),
        ]);
        assert!(validate_new_order(&order).is_err());
    }

    #[test]
    fn oversized_quantity_is_rejected() {
        let order = order_with_lines(vec![NewOrderLine::new(ProductId::new(), u32::MAX)]);
        assert!(validate_new_order(&order).is_err());
    }

    #[test]
    fn duplicate_product_lines_are_rejected() {
        let id = ProductId::new();
        let order = order_with_lines(vec![
            NewOrderLine::new(id, 1),
            NewOrderLine::new(id, 2),
        ]);
        assert!(validate_new_order(&order).is_err());
    }

    #[test]
    fn positive_quantities_pass() {
        let order = order_with_lines(vec![NewOrderLine::new(ProductId::new(), 1)]);
        assert!(validate_new_order(&order).is_ok());
    }
}
