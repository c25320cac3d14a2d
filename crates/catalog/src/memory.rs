//! In-memory catalog store implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, OrderId, ProductId};
use tokio::sync::RwLock;

use crate::order::{NewOrder, OrderLine, OrderReceipt, PlacedOrder};
use crate::product::{AttrValue, Product, ProductSummary};
use crate::search::ProductFilter;
use crate::store::CatalogStore;
use crate::{CatalogError, Result};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: Vec<PlacedOrder>,
}

/// In-memory catalog store.
///
/// This implementation stores all data in memory and provides the same
/// interface and atomicity contract as the PostgreSQL implementation: the
/// whole check-and-decrement runs under one write lock, so overlapping
/// purchases serialize exactly as they would under the database's
/// transaction mechanism (within a single process).
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryCatalogStore {
    /// Creates a new empty in-memory catalog store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product. Seeding hook for tests and demos;
    /// vendor-side product management is outside this core.
    pub async fn upsert_product(&self, product: Product) {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
    }

    /// Flags a product as soft-deleted.
    pub async fn soft_delete_product(&self, id: ProductId) {
        if let Some(product) = self.state.write().await.products.get_mut(&id) {
            product.is_deleted = true;
        }
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all products and orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.products.clear();
        state.orders.clear();
    }
}

/// Applies one attribute probe against a product's bag, mirroring the SQL
/// the query builder generates: equality per value type, floor threshold
/// for threshold keys, and an absent key matches nothing.
fn attribute_matches(product: &Product, name: &str, requested: &AttrValue) -> bool {
    let Some(stored) = product.attributes.get(name) else {
        return false;
    };

    if ProductFilter::is_threshold_key(name) {
        if let (Some(stored), Some(requested)) = (stored.as_number(), requested.as_number()) {
            return stored >= requested;
        }
    }

    stored.loosely_eq(requested)
}

fn filter_matches(product: &Product, filter: &ProductFilter) -> bool {
    if product.is_deleted || product.category != filter.category {
        return false;
    }
    if let Some(min) = filter.min_price_cents
        && product.price_cents < min
    {
        return false;
    }
    if let Some(max) = filter.max_price_cents
        && product.price_cents > max
    {
        return false;
    }
    if let Some(vendor_id) = filter.vendor_id
        && product.vendor_id != vendor_id
    {
        return false;
    }
    if let Some(is_new) = filter.is_new
        && product.is_new != is_new
    {
        return false;
    }
    filter
        .attributes
        .iter()
        .all(|(name, value)| attribute_matches(product, name, value))
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn place_order(&self, order: NewOrder) -> Result<OrderReceipt> {
        // One write lock across the whole check-and-decrement; nothing can
        // observe a partially applied cart.
        let mut state = self.state.write().await;

        for line in &order.lines {
            match state.products.get(&line.product_id) {
                None => return Err(CatalogError::ProductNotFound(line.product_id)),
                Some(p) if p.is_deleted => {
                    return Err(CatalogError::ProductNotFound(line.product_id));
                }
                Some(p) if i64::from(line.quantity) > p.stock => {
                    return Err(CatalogError::InsufficientStock(line.product_id));
                }
                Some(_) => {}
            }
        }

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let product = state
                .products
                .get_mut(&line.product_id)
                .expect("checked above");
            product.stock -= i64::from(line.quantity);
            lines.push(OrderLine {
                product_id: line.product_id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                price_cents: product.price_cents,
            });
        }

        let placed = PlacedOrder {
            id: OrderId::new(),
            customer_id: order.customer_id,
            created_at: Utc::now(),
            delivery_address: order.delivery_address,
            paid_with_cash: order.paid_with_cash,
            lines,
        };
        let receipt = OrderReceipt {
            order_id: placed.id,
            total_cents: placed.total_cents(),
        };
        state.orders.push(placed);

        Ok(receipt)
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<ProductSummary>> {
        let state = self.state.read().await;

        let mut results: Vec<ProductSummary> = state
            .products
            .values()
            .filter(|p| filter_matches(p, filter))
            .map(ProductSummary::from)
            .collect();
        results.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.as_uuid().cmp(&b.id.as_uuid())));

        Ok(results)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .get(&id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<PlacedOrder>> {
        let state = self.state.read().await;
        let mut orders: Vec<PlacedOrder> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NewOrderLine;
    use crate::product::{AttributeBag, Category};
    use common::VendorId;

    fn product(category: Category, price_cents: i64, stock: i64) -> Product {
        Product {
            id: ProductId::new(),
            vendor_id: VendorId::new(),
            name: format!("{category} unit"),
            description: "test product".to_string(),
            model: "T-1000".to_string(),
            category,
            price_cents,
            stock,
            is_new: true,
            attributes: AttributeBag::new(),
            is_deleted: false,
        }
    }

    fn cart(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            customer_id: CustomerId::new(),
            lines,
            delivery_address: "1 Example St".to_string(),
            paid_with_cash: true,
        }
    }

    #[tokio::test]
    async fn successful_cart_decrements_stock_and_records_order() {
        let store = InMemoryCatalogStore::new();
        let cpu = product(Category::Cpu, 30_000, 10);
        let cpu_id = cpu.id;
        store.upsert_product(cpu).await;

        let receipt = store
            .place_order(cart(vec![NewOrderLine::new(cpu_id, 3)]))
            .await
            .unwrap();

        let remaining = store.get_product(cpu_id).await.unwrap().unwrap().stock;
        assert_eq!(remaining, 7);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(receipt.total_cents, 3 * 30_000);
        assert!(!receipt.order_id.to_string().is_empty());
    }

    #[tokio::test]
    async fn short_stock_rejects_whole_cart() {
        let store = InMemoryCatalogStore::new();
        let cpu = product(Category::Cpu, 30_000, 10);
        let ram = product(Category::Ram, 8_000, 1);
        let (cpu_id, ram_id) = (cpu.id, ram.id);
        store.upsert_product(cpu).await;
        store.upsert_product(ram).await;

        let err = store
            .place_order(cart(vec![
                NewOrderLine::new(cpu_id, 2),
                NewOrderLine::new(ram_id, 5),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::InsufficientStock(id) if id == ram_id));
        // No partial purchase: the cpu line must not have been applied.
        assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 10);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn soft_deleted_product_reads_as_missing() {
        let store = InMemoryCatalogStore::new();
        let gpu = product(Category::Gpu, 90_000, 4);
        let gpu_id = gpu.id;
        store.upsert_product(gpu).await;
        store.soft_delete_product(gpu_id).await;

        assert!(store.get_product(gpu_id).await.unwrap().is_none());

        let err = store
            .place_order(cart(vec![NewOrderLine::new(gpu_id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(id) if id == gpu_id));
    }

    #[tokio::test]
    async fn search_applies_attribute_probes() {
        let store = InMemoryCatalogStore::new();
        let mut eight_core = product(Category::Cpu, 30_000, 5);
        eight_core
            .attributes
            .insert("cores".to_string(), AttrValue::Int(8));
        let mut four_core = product(Category::Cpu, 20_000, 5);
        four_core
            .attributes
            .insert("cores".to_string(), AttrValue::Int(4));
        let eight_core_id = eight_core.id;
        store.upsert_product(eight_core).await;
        store.upsert_product(four_core).await;

        let filter = ProductFilter::for_category(Category::Cpu).attribute("cores", 8i64);
        let results = store.search_products(&filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, eight_core_id);

        // Unknown key is a harmless probe that matches nothing.
        let filter = ProductFilter::for_category(Category::Cpu).attribute("wattage", 65i64);
        assert!(store.search_products(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_type_mismatched_probe_matches_nothing() {
        let store = InMemoryCatalogStore::new();
        let mut odd = product(Category::Cpu, 10_000, 1);
        odd.attributes
            .insert("cores".to_string(), AttrValue::Text("fast".to_string()));
        store.upsert_product(odd).await;

        // A numeric probe against a text value is harmless, never an error.
        let filter = ProductFilter::for_category(Category::Cpu).attribute("cores", 8i64);
        assert!(store.search_products(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_base_clock_is_floor_threshold() {
        let store = InMemoryCatalogStore::new();
        let mut fast = product(Category::Cpu, 40_000, 2);
        fast.attributes
            .insert("base_clock".to_string(), AttrValue::Float(4.2));
        let mut slow = product(Category::Cpu, 15_000, 2);
        slow.attributes
            .insert("base_clock".to_string(), AttrValue::Float(2.8));
        let fast_id = fast.id;
        store.upsert_product(fast).await;
        store.upsert_product(slow).await;

        let filter = ProductFilter::for_category(Category::Cpu).attribute("base_clock", 3.0);
        let results = store.search_products(&filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, fast_id);
    }

    #[tokio::test]
    async fn search_price_bounds_are_inclusive() {
        let store = InMemoryCatalogStore::new();
        for price in [99, 100, 300, 500, 501] {
            store.upsert_product(product(Category::Drive, price, 1)).await;
        }

        let filter = ProductFilter::for_category(Category::Drive)
            .min_price_cents(100)
            .max_price_cents(500);
        let results = store.search_products(&filter).await.unwrap();
        assert_eq!(results.len(), 3);

        let unbounded = ProductFilter::for_category(Category::Drive);
        assert_eq!(store.search_products(&unbounded).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn order_history_snapshots_prices() {
        let store = InMemoryCatalogStore::new();
        let mut cpu = product(Category::Cpu, 30_000, 10);
        let cpu_id = cpu.id;
        store.upsert_product(cpu.clone()).await;

        let customer_id = CustomerId::new();
        store
            .place_order(NewOrder {
                customer_id,
                lines: vec![NewOrderLine::new(cpu_id, 2)],
                delivery_address: "1 Example St".to_string(),
                paid_with_cash: false,
            })
            .await
            .unwrap();

        // A later price change must not touch the committed line.
        cpu.price_cents = 99_000;
        cpu.stock = 8;
        store.upsert_product(cpu).await;

        let orders = store.orders_for_customer(customer_id).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].lines[0].price_cents, 30_000);
        assert_eq!(orders[0].total_cents(), 60_000);
    }
}
