//! HTTP API for the shop backend.
//!
//! Exposes the public catalog, the customer order endpoints and the
//! merchant fulfillment endpoints under `/v1`, plus `/health` and a
//! Prometheus `/metrics` scrape endpoint.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use store::ShopStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ShopStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{customer, merchant, public};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let v1 = Router::new()
        .route("/common/product", get(public::list_products::<S>))
        .route("/common/product/{id}", get(public::get_product::<S>))
        .route("/user", get(customer::profile::<S>))
        .route(
            "/user/order",
            get(customer::list_orders::<S>).post(customer::create_order::<S>),
        )
        .route(
            "/user/order/{id}",
            get(customer::get_order::<S>).patch(customer::update_order::<S>),
        )
        .route("/merchant/product", get(merchant::list_products::<S>))
        .route("/merchant/product/{id}", get(merchant::get_product::<S>))
        .route("/merchant/order", get(merchant::list_orders::<S>))
        .route(
            "/merchant/order/{id}",
            get(merchant::get_order::<S>).patch(merchant::update_order_item::<S>),
        )
        .route("/merchant/category", get(merchant::list_categories::<S>))
        .route("/merchant/category/{id}", get(merchant::get_category::<S>))
        .route("/merchant/brand", get(merchant::list_brands::<S>))
        .route("/merchant/brand/{id}", get(merchant::get_brand::<S>));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/v1", v1)
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
