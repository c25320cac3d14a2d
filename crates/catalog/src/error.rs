//! Catalog store error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A referenced product does not exist or is soft-deleted.
    /// Not retryable; the caller must correct the cart.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The requested quantity exceeds the product's available stock.
    /// Not retryable without changing the request.
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// The transaction hit an isolation conflict or exceeded its lock-wait
    /// or execution budget. The whole transaction was rolled back, so
    /// resubmitting the identical request is safe.
    #[error("Transient conflict, the request may be retried")]
    TransientConflict,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    /// True when retrying the identical request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::TransientConflict)
    }
}

/// Result type for catalog store operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
