//! HTTP surface for the marketplace core.
//!
//! Exposes order placement and the specification product search over REST,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog::CatalogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::{InMemoryPaymentGateway, PlacementEngine};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CatalogStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/products/search", post(routes::products::search::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/customers/{id}/orders", get(routes::orders::history::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store, with the
/// in-memory payment gateway standing in for a real processor.
pub fn create_default_state<S: CatalogStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let engine = PlacementEngine::new(store.clone(), InMemoryPaymentGateway::new());
    Arc::new(AppState { engine, store })
}
