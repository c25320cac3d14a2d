//! PostgreSQL-backed catalog store implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, OrderId, ProductId, VendorId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::order::{NewOrder, OrderLine, OrderReceipt, PlacedOrder};
use crate::product::{AttributeBag, Category, Product, ProductSummary};
use crate::search::{BindValue, ProductFilter};
use crate::store::CatalogStore;
use crate::{CatalogError, Result};

/// Default bound on how long a transaction may wait for a row lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on the overall execution time of any statement inside the
/// placement transaction.
const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL catalog store.
///
/// All stock exclusion is delegated to the database: the placement
/// transaction runs serializable and takes row locks on the products it
/// reads, so overlapping purchases against the same product serialize in
/// the database regardless of how many service instances are running.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
    lock_timeout: Duration,
    statement_timeout: Duration,
}

impl PostgresCatalogStore {
    /// Creates a new PostgreSQL catalog store with default budgets.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Overrides the lock-wait and execution budgets of the placement
    /// transaction. Exceeding either aborts the transaction cleanly and
    /// surfaces as [`CatalogError::TransientConflict`].
    pub fn with_budgets(mut self, lock_timeout: Duration, statement_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self.statement_timeout = statement_timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let category_text: String = row.try_get("category")?;
        let category: Category = serde_json::from_value(serde_json::Value::String(category_text))?;

        let attrs_json: serde_json::Value = row.try_get("attributes")?;
        let attributes: AttributeBag = serde_json::from_value(attrs_json)?;

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            vendor_id: VendorId::from_uuid(row.try_get::<Uuid, _>("vendor_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            model: row.try_get("model")?,
            category,
            price_cents: row.try_get("price_cents")?,
            stock: row.try_get("stock")?,
            is_new: row.try_get("is_new")?,
            attributes,
            is_deleted: row.try_get("is_deleted")?,
        })
    }

    fn row_to_summary(row: PgRow) -> Result<ProductSummary> {
        Ok(ProductSummary {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            model: row.try_get("model")?,
            price_cents: row.try_get("price_cents")?,
            stock: row.try_get("stock")?,
            is_new: row.try_get("is_new")?,
        })
    }
}

/// Downgrades isolation conflicts and budget overruns to
/// [`CatalogError::TransientConflict`]; everything else stays a database
/// error.
///
/// SQLSTATEs: 40001 serialization failure, 40P01 deadlock detected,
/// 55P03 lock not available, 57014 query canceled (statement timeout).
fn classify(e: sqlx::Error) -> CatalogError {
    if let sqlx::Error::Database(ref db_err) = e
        && let Some(code) = db_err.code()
        && matches!(code.as_ref(), "40001" | "40P01" | "55P03" | "57014")
    {
        return CatalogError::TransientConflict;
    }
    CatalogError::Database(e)
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[tracing::instrument(
        skip(self, order),
        fields(customer_id = %order.customer_id, lines = order.lines.len())
    )]
    async fn place_order(&self, order: NewOrder) -> Result<OrderReceipt> {
        let mut tx = self.pool.begin().await?;

        // Must be the first statements in the transaction. SET LOCAL scopes
        // both budgets to this transaction only.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        // Step 1: row-locked load of stock and price for exactly the
        // requested, non-deleted products.
        let requested_ids: Vec<Uuid> = order.lines.iter().map(|l| l.product_id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT id, price_cents, stock FROM products \
             WHERE id = ANY($1) AND is_deleted = FALSE \
             FOR UPDATE",
        )
        .bind(&requested_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(classify)?;

        let mut loaded: HashMap<Uuid, (i64, i64)> = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let price_cents: i64 = row.try_get("price_cents")?;
            let stock: i64 = row.try_get("stock")?;
            loaded.insert(id, (price_cents, stock));
        }

        // Steps 2 and 3: reject the whole cart on any missing product or
        // short stock. Returning early drops the transaction, which rolls
        // it back with zero side effects.
        let mut total_cents: i64 = 0;
        for line in &order.lines {
            let Some(&(price_cents, stock)) = loaded.get(&line.product_id.as_uuid()) else {
                tracing::debug!(product_id = %line.product_id, "rejecting cart, product missing or soft-deleted");
                return Err(CatalogError::ProductNotFound(line.product_id));
            };
            if i64::from(line.quantity) > stock {
                tracing::debug!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    available = stock,
                    "rejecting cart, insufficient stock"
                );
                return Err(CatalogError::InsufficientStock(line.product_id));
            }
            total_cents += price_cents * i64::from(line.quantity);
        }

        // Step 4: decrement stock and insert the order with its lines,
        // freezing each line's price from the locked read above.
        for line in &order.lines {
            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(i64::from(line.quantity))
                .bind(line.product_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(classify)?;
        }

        let order_id = OrderId::new();
        sqlx::query(
            "INSERT INTO orders (id, customer_id, created_at, delivery_address, paid_with_cash) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(Utc::now())
        .bind(&order.delivery_address)
        .bind(order.paid_with_cash)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        for line in &order.lines {
            let (price_cents, _) = loaded[&line.product_id.as_uuid()];
            sqlx::query(
                "INSERT INTO order_lines (order_id, product_id, quantity, price_cents) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .bind(price_cents)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await.map_err(classify)?;
        Ok(OrderReceipt {
            order_id,
            total_cents,
        })
    }

    #[tracing::instrument(skip(self, filter), fields(category = %filter.category))]
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<ProductSummary>> {
        let (sql, params) = filter.to_sql();

        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                BindValue::Text(s) => query.bind(s),
                BindValue::Int(n) => query.bind(n),
                BindValue::Float(n) => query.bind(n),
                BindValue::Bool(b) => query.bind(b),
                BindValue::Uuid(u) => query.bind(u),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(classify)?;
        rows.into_iter().map(Self::row_to_summary).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, vendor_id, name, description, model, category, price_cents, \
                    stock, is_new, attributes, is_deleted \
             FROM products WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<PlacedOrder>> {
        let order_rows = sqlx::query(
            "SELECT id, customer_id, created_at, delivery_address, paid_with_cash \
             FROM orders WHERE customer_id = $1 \
             ORDER BY created_at DESC, id",
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let order_ids: Vec<Uuid> = order_rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<std::result::Result<_, sqlx::Error>>()?;

        let line_rows = sqlx::query(
            "SELECT ol.order_id, ol.product_id, ol.quantity, ol.price_cents, p.name \
             FROM order_lines ol \
             JOIN products p ON p.id = ol.product_id \
             WHERE ol.order_id = ANY($1) \
             ORDER BY p.name",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(OrderLine {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    product_name: row.try_get("name")?,
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    price_cents: row.try_get("price_cents")?,
                });
        }

        order_rows
            .into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Ok(PlacedOrder {
                    id: OrderId::from_uuid(id),
                    customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
                    created_at: row.try_get("created_at")?,
                    delivery_address: row.try_get("delivery_address")?,
                    paid_with_cash: row.try_get("paid_with_cash")?,
                    lines: lines_by_order.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }
}
