//! Product search and detail endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog::store::CatalogStoreExt;
use catalog::{CatalogError, CatalogStore, CategoryAttributes, ProductFilter};
use common::{ProductId, VendorId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::orders::AppState;

// -- Request types --

/// Search request: the category tag and its attribute fields sit at the
/// top level alongside the fixed filters.
#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub attributes: CategoryAttributes,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub vendor_id: Option<Uuid>,
    pub is_new: Option<bool>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductSummaryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub price_cents: i64,
    pub stock: i64,
    pub is_new: bool,
}

#[derive(Serialize)]
pub struct ProductDetailResponse {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub is_new: bool,
    pub attributes: serde_json::Value,
}

// -- Handlers --

/// POST /products/search — parameterized product search.
#[tracing::instrument(skip(state, req))]
pub async fn search<S: CatalogStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<ProductSummaryResponse>>, ApiError> {
    let mut filter = ProductFilter::from_attributes(req.attributes);
    filter.min_price_cents = req.min_price_cents;
    filter.max_price_cents = req.max_price_cents;
    filter.vendor_id = req.vendor_id.map(VendorId::from_uuid);
    filter.is_new = req.is_new;

    let results = state.store.search_products(&filter).await?;

    let responses = results
        .into_iter()
        .map(|p| ProductSummaryResponse {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            model: p.model,
            price_cents: p.price_cents,
            stock: p.stock,
            is_new: p.is_new,
        })
        .collect();

    Ok(Json(responses))
}

/// GET /products/:id — product detail, 404 for missing or soft-deleted.
#[tracing::instrument(skip(state))]
pub async fn get<S: CatalogStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product = state
        .store
        .require_product(ProductId::from_uuid(id))
        .await
        .map_err(|e| match e {
            CatalogError::ProductNotFound(id) => {
                ApiError::NotFound(format!("Product {id} not found"))
            }
            other => ApiError::Catalog(other),
        })?;

    let attributes =
        serde_json::to_value(&product.attributes).map_err(CatalogError::Serialization)?;

    Ok(Json(ProductDetailResponse {
        id: product.id.to_string(),
        vendor_id: product.vendor_id.to_string(),
        name: product.name,
        description: product.description,
        model: product.model,
        category: product.category.to_string(),
        price_cents: product.price_cents,
        stock: product.stock,
        is_new: product.is_new,
        attributes,
    }))
}
