//! Placement error taxonomy.

use catalog::CatalogError;
use common::ProductId;
use thiserror::Error;

/// Errors surfaced by [`crate::PlacementEngine::place_order`].
///
/// The first two are business-rule failures carrying enough detail for the
/// caller to correct the cart; `TransientConflict` is generic and safely
/// retryable; `Internal` is deliberately opaque, with the underlying store
/// detail logged server-side only.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// A referenced product does not exist or is soft-deleted.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Requested quantity exceeds the product's available stock.
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// Isolation conflict or timeout; resubmitting the identical request
    /// is safe.
    #[error("The order could not be placed right now, please retry")]
    TransientConflict,

    /// The cart failed shape validation before any store access.
    #[error("Invalid cart: {0}")]
    InvalidCart(String),

    /// Unexpected store failure.
    #[error("Internal error")]
    Internal,
}

impl From<CatalogError> for PlaceOrderError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => PlaceOrderError::NotFound(id),
            CatalogError::InsufficientStock(id) => PlaceOrderError::InsufficientStock(id),
            CatalogError::TransientConflict => PlaceOrderError::TransientConflict,
            CatalogError::Database(_) | CatalogError::Migration(_) | CatalogError::Serialization(_) => {
                PlaceOrderError::Internal
            }
        }
    }
}
