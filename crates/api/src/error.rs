//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use ordering::PlaceOrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement failure.
    Place(PlaceOrderError),
    /// Catalog read failure.
    Catalog(CatalogError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Place(err) => place_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn place_error_to_response(err: PlaceOrderError) -> (StatusCode, String) {
    match &err {
        // Business-rule failures carry the product so the caller can
        // correct the cart.
        PlaceOrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PlaceOrderError::InsufficientStock(_) => (StatusCode::CONFLICT, err.to_string()),
        PlaceOrderError::InvalidCart(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        // Generic and retryable.
        PlaceOrderError::TransientConflict => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        // Opaque; the engine already logged the store detail.
        PlaceOrderError::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        ),
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::TransientConflict => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => {
            tracing::error!(error = %err, "catalog read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    }
}

impl From<PlaceOrderError> for ApiError {
    fn from(err: PlaceOrderError) -> Self {
        ApiError::Place(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}
