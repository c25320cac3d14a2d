//! Shared types for the marketplace core.

pub mod ids;

pub use ids::{CustomerId, OrderId, ProductId, VendorId};
