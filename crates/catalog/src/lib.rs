//! Catalog store for the marketplace core.
//!
//! Owns the product/order data model, the `CatalogStore` trait with its
//! PostgreSQL and in-memory implementations, and the specification query
//! builder that turns per-category attribute filters into parameterized SQL.

pub mod attributes;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod search;
pub mod store;

pub use attributes::CategoryAttributes;
pub use common::{CustomerId, OrderId, ProductId, VendorId};
pub use error::{CatalogError, Result};
pub use memory::InMemoryCatalogStore;
pub use order::{NewOrder, NewOrderLine, OrderLine, OrderReceipt, PlacedOrder};
pub use postgres::PostgresCatalogStore;
pub use product::{AttrValue, AttributeBag, Category, Product, ProductSummary};
pub use search::ProductFilter;
pub use store::CatalogStore;
