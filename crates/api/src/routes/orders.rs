//! Order placement and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog::{CatalogStore, NewOrder, NewOrderLine};
use common::{CustomerId, ProductId};
use ordering::{InMemoryPaymentGateway, PlacementEngine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CatalogStore> {
    pub engine: PlacementEngine<S, InMemoryPaymentGateway>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Uuid,
    pub products: Vec<OrderLineRequest>,
    pub delivery_address: String,
    pub paid_with_cash: bool,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub created_at: String,
    pub delivery_address: String,
    pub paid_with_cash: bool,
    pub total_cents: i64,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
}

// -- Handlers --

/// POST /orders — place an order for a cart of products.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: CatalogStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let order = NewOrder {
        customer_id: CustomerId::from_uuid(req.customer_id),
        lines: req
            .products
            .iter()
            .map(|line| NewOrderLine::new(ProductId::from_uuid(line.product_id), line.quantity))
            .collect(),
        delivery_address: req.delivery_address,
        paid_with_cash: req.paid_with_cash,
    };

    let order_id = state.engine.place_order(order).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: order_id.to_string(),
        }),
    ))
}

/// GET /customers/:id/orders — a customer's order history with lines.
#[tracing::instrument(skip(state))]
pub async fn history<S: CatalogStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .store
        .orders_for_customer(CustomerId::from_uuid(id))
        .await?;

    let responses: Vec<OrderResponse> = orders
        .into_iter()
        .map(|o| OrderResponse {
            id: o.id.to_string(),
            customer_id: o.customer_id.to_string(),
            created_at: o.created_at.to_rfc3339(),
            delivery_address: o.delivery_address.clone(),
            paid_with_cash: o.paid_with_cash,
            total_cents: o.total_cents(),
            lines: o
                .lines
                .iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id.to_string(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    price_cents: line.price_cents,
                })
                .collect(),
        })
        .collect();

    Ok(Json(responses))
}
