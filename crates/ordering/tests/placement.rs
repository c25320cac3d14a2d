//! Placement engine integration tests over the in-memory catalog store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog::{
    AttributeBag, CatalogError, CatalogStore, Category, CustomerId, InMemoryCatalogStore,
    NewOrder, NewOrderLine, OrderReceipt, PlacedOrder, Product, ProductFilter, ProductId,
    ProductSummary, VendorId,
};
use ordering::{InMemoryPaymentGateway, PlaceOrderError, PlacementEngine};

fn product(name: &str, price_cents: i64, stock: i64) -> Product {
    Product {
        id: ProductId::new(),
        vendor_id: VendorId::new(),
        name: name.to_string(),
        description: String::new(),
        model: String::new(),
        category: Category::Cpu,
        price_cents,
        stock,
        is_new: true,
        attributes: AttributeBag::new(),
        is_deleted: false,
    }
}

fn cart(customer_id: CustomerId, lines: Vec<NewOrderLine>) -> NewOrder {
    NewOrder {
        customer_id,
        lines,
        delivery_address: "1 Example St".to_string(),
        paid_with_cash: true,
    }
}

/// Waits briefly for the detached settlement task to land.
async fn wait_for_settlements(gateway: &InMemoryPaymentGateway, expected: usize) {
    for _ in 0..100 {
        if gateway.settlement_count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {expected} settlements, saw {}",
        gateway.settlement_count()
    );
}

#[tokio::test]
async fn sufficient_stock_commits_and_settles() {
    let store = InMemoryCatalogStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let engine = PlacementEngine::new(store.clone(), gateway.clone());

    let cpu = product("cpu", 30_000, 10);
    let ram = product("ram", 8_000, 4);
    let (cpu_id, ram_id) = (cpu.id, ram.id);
    store.upsert_product(cpu).await;
    store.upsert_product(ram).await;

    let customer_id = CustomerId::new();
    let order_id = engine
        .place_order(cart(
            customer_id,
            vec![NewOrderLine::new(cpu_id, 3), NewOrderLine::new(ram_id, 2)],
        ))
        .await
        .unwrap();

    assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 7);
    assert_eq!(store.get_product(ram_id).await.unwrap().unwrap().stock, 2);

    let orders = store.orders_for_customer(customer_id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    // Line prices snapshotted from the catalog at placement time.
    assert_eq!(orders[0].total_cents(), 3 * 30_000 + 2 * 8_000);

    wait_for_settlements(&gateway, 1).await;
    assert!(gateway.has_settlement_for(order_id));
    // Settlement carries the committed total, not re-read prices.
    assert_eq!(
        gateway.settled_amount_for(order_id),
        Some(3 * 30_000 + 2 * 8_000)
    );
}

#[tokio::test]
async fn short_stock_fails_whole_cart_without_side_effects() {
    let store = InMemoryCatalogStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let engine = PlacementEngine::new(store.clone(), gateway.clone());

    let cpu = product("cpu", 30_000, 10);
    let ram = product("ram", 8_000, 1);
    let (cpu_id, ram_id) = (cpu.id, ram.id);
    store.upsert_product(cpu).await;
    store.upsert_product(ram).await;

    let customer_id = CustomerId::new();
    let err = engine
        .place_order(cart(
            customer_id,
            vec![NewOrderLine::new(cpu_id, 2), NewOrderLine::new(ram_id, 5)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaceOrderError::InsufficientStock(id) if id == ram_id));
    assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 10);
    assert_eq!(store.get_product(ram_id).await.unwrap().unwrap().stock, 1);
    assert!(store.orders_for_customer(customer_id).await.unwrap().is_empty());

    // No commit, no settlement.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gateway.settlement_count(), 0);
}

#[tokio::test]
async fn unknown_product_fails_with_not_found() {
    let store = InMemoryCatalogStore::new();
    let engine = PlacementEngine::new(store.clone(), InMemoryPaymentGateway::new());

    let ghost = ProductId::new();
    let err = engine
        .place_order(cart(CustomerId::new(), vec![NewOrderLine::new(ghost, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaceOrderError::NotFound(id) if id == ghost));
}

#[tokio::test]
async fn empty_and_zero_quantity_carts_are_invalid() {
    let store = InMemoryCatalogStore::new();
    let engine = PlacementEngine::new(store.clone(), InMemoryPaymentGateway::new());

    let err = engine
        .place_order(cart(CustomerId::new(), vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceOrderError::InvalidCart(_)));

    let cpu = product("cpu", 30_000, 10);
    let cpu_id = cpu.id;
    store.upsert_product(cpu).await;

    let err = engine
        .place_order(cart(CustomerId::new(), vec![NewOrderLine::new(cpu_id, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceOrderError::InvalidCart(_)));
    assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 10);
}

#[tokio::test]
async fn concurrent_carts_cannot_oversell() {
    let store = InMemoryCatalogStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let engine = Arc::new(PlacementEngine::new(store.clone(), gateway.clone()));

    let cpu = product("cpu", 30_000, 5);
    let cpu_id = cpu.id;
    store.upsert_product(cpu).await;

    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .place_order(cart(CustomerId::new(), vec![NewOrderLine::new(cpu_id, 3)]))
                .await
        })
    };
    let second = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .place_order(cart(CustomerId::new(), vec![NewOrderLine::new(cpu_id, 3)]))
                .await
        })
    };

    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the two carts may win");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.unwrap_err(),
        PlaceOrderError::InsufficientStock(id) if id == cpu_id
    ));

    // 5 - 3 = 2: never negative, never double-allocated.
    assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 2);
    assert_eq!(store.order_count().await, 1);
}

/// Store wrapper that reports a transient conflict for the first N
/// placement attempts, then delegates.
#[derive(Clone)]
struct FlakyStore {
    inner: InMemoryCatalogStore,
    conflicts_left: Arc<AtomicU32>,
}

impl FlakyStore {
    fn new(inner: InMemoryCatalogStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_left: Arc::new(AtomicU32::new(conflicts)),
        }
    }
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn place_order(&self, order: NewOrder) -> Result<OrderReceipt, CatalogError> {
        if self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CatalogError::TransientConflict);
        }
        self.inner.place_order(order).await
    }

    async fn search_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, CatalogError> {
        self.inner.search_products(filter).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        self.inner.get_product(id).await
    }

    async fn orders_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PlacedOrder>, CatalogError> {
        self.inner.orders_for_customer(customer_id).await
    }
}

#[tokio::test]
async fn transient_conflicts_are_retried_transparently() {
    let inner = InMemoryCatalogStore::new();
    let cpu = product("cpu", 30_000, 5);
    let cpu_id = cpu.id;
    inner.upsert_product(cpu).await;

    // Two conflicts, then success: within the default three attempts.
    let store = FlakyStore::new(inner.clone(), 2);
    let engine = PlacementEngine::new(store, InMemoryPaymentGateway::new());

    let customer_id = CustomerId::new();
    engine
        .place_order(cart(customer_id, vec![NewOrderLine::new(cpu_id, 1)]))
        .await
        .unwrap();

    // Exactly one order despite the retries.
    assert_eq!(inner.order_count().await, 1);
    assert_eq!(inner.get_product(cpu_id).await.unwrap().unwrap().stock, 4);
}

#[tokio::test]
async fn exhausted_retries_surface_transient_conflict_and_resubmission_succeeds() {
    let inner = InMemoryCatalogStore::new();
    let cpu = product("cpu", 30_000, 5);
    let cpu_id = cpu.id;
    inner.upsert_product(cpu).await;

    let store = FlakyStore::new(inner.clone(), 3);
    let engine = PlacementEngine::new(store, InMemoryPaymentGateway::new());

    let customer_id = CustomerId::new();
    let request = cart(customer_id, vec![NewOrderLine::new(cpu_id, 2)]);

    let err = engine.place_order(request.clone()).await.unwrap_err();
    assert!(matches!(err, PlaceOrderError::TransientConflict));
    assert_eq!(inner.order_count().await, 0);
    assert_eq!(inner.get_product(cpu_id).await.unwrap().unwrap().stock, 5);

    // Identical resubmission after the conflicts clear: one order, once.
    engine.place_order(request).await.unwrap();
    assert_eq!(inner.order_count().await, 1);
    assert_eq!(inner.get_product(cpu_id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
async fn failed_settlement_never_reverts_the_order() {
    let store = InMemoryCatalogStore::new();
    let gateway = InMemoryPaymentGateway::new();
    gateway.set_fail_on_settle(true);
    let engine = PlacementEngine::new(store.clone(), gateway.clone());

    let cpu = product("cpu", 30_000, 5);
    let cpu_id = cpu.id;
    store.upsert_product(cpu).await;

    let customer_id = CustomerId::new();
    engine
        .place_order(cart(customer_id, vec![NewOrderLine::new(cpu_id, 2)]))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.settlement_count(), 0);

    // The order stands regardless of the settlement outcome.
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.get_product(cpu_id).await.unwrap().unwrap().stock, 3);
}
