//! Order data model.
//!
//! Orders and their lines are created exclusively by the order-placement
//! path, always together and atomically, and are immutable afterwards.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// A purchase request: what the caller wants to buy.
///
/// Validated against live stock inside one store transaction; prices are
/// never part of the request, they are snapshotted from the catalog at the
/// moment stock is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub lines: Vec<NewOrderLine>,
    pub delivery_address: String,
    pub paid_with_cash: bool,
}

/// One line of a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl NewOrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// What a committed placement hands back: the new order's id and its
/// total, summed from the snapshotted line prices inside the same
/// transaction that validated the stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total_cents: i64,
}

/// A committed order with its lines, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
    pub delivery_address: String,
    pub paid_with_cash: bool,
    pub lines: Vec<OrderLine>,
}

impl PlacedOrder {
    /// Total of the order in cents, from the snapshotted line prices.
    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.price_cents * i64::from(l.quantity))
            .sum()
    }
}

/// One committed order line.
///
/// `price_cents` is the product's price at the moment stock was validated;
/// later catalog price changes never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Product name at read time, joined in for display.
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
}
