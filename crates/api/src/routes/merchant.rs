//! Endpoints for merchants: their catalog, their order items and the
//! reference data used to compose products.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::{
    Brand, BrandId, Category, CategoryId, OrderId, OrderItem, OrderItemId, Product, ProductId,
    Role,
};
use domain::{
    ListingParams, OrderFilter, OrderListing, ProductFilter, RequestedTransition, authorize_item,
    require_role,
};
use store::{Page, ShopStore};

use super::{StatusUpdate, StatusUpdated, parse_id};
use crate::error::ApiError;
use crate::extract::AuthenticatedActor;
use crate::state::AppState;

/// GET /v1/merchant/product: the caller's own catalog.
#[tracing::instrument(skip(state, params))]
pub async fn list_products<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Page<Product>>, ApiError> {
    let Query(params) = params?;
    let filter = ProductFilter::from_params(&params)?;
    Ok(Json(
        state.catalog.list_merchant_products(actor, &filter).await?,
    ))
}

/// GET /v1/merchant/product/{id}
#[tracing::instrument(skip(state))]
pub async fn get_product<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id, ProductId::parse)?;
    Ok(Json(state.catalog.get_merchant_product(actor, id).await?))
}

/// GET /v1/merchant/order: the caller's order items, newest first.
#[tracing::instrument(skip(state, params))]
pub async fn list_orders<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<OrderListing>, ApiError> {
    require_role(&actor, Role::Merchant, "list merchant orders")?;
    let Query(params) = params?;
    let filter = OrderFilter::from_params(&params)?;
    Ok(Json(state.catalog.list_orders(actor, &filter).await?))
}

/// GET /v1/merchant/order/{id}: the caller's items of one order.
#[tracing::instrument(skip(state))]
pub async fn get_order<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderItem>>, ApiError> {
    let id = parse_id(&id, OrderId::parse)?;
    Ok(Json(state.orders.get_merchant_order(actor, id).await?))
}

/// PATCH /v1/merchant/order/{id}: request a status change on one order
/// item (shipping).
#[tracing::instrument(skip(state, body))]
pub async fn update_order_item<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<StatusUpdated>, ApiError> {
    let id = parse_id(&id, OrderItemId::parse)?;
    let Json(update) = body?;
    let transition = RequestedTransition::parse_for_item(&update.status)?;
    let requested = authorize_item(actor.role, transition)?;

    let previous = state
        .orders
        .update_order_item_status(actor, id, requested)
        .await?;

    Ok(Json(StatusUpdated {
        id: id.to_string(),
        status: requested.to_string(),
        previous_status: previous.to_string(),
    }))
}

/// GET /v1/merchant/category
pub async fn list_categories<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<Category>>, ApiError> {
    require_role(&actor, Role::Merchant, "list categories")?;
    Ok(Json(state.catalog.list_categories().await?))
}

/// GET /v1/merchant/category/{id}
pub async fn get_category<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    require_role(&actor, Role::Merchant, "view category")?;
    let id = parse_id(&id, CategoryId::parse)?;
    Ok(Json(state.catalog.find_category(id).await?))
}

/// GET /v1/merchant/brand
pub async fn list_brands<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<Brand>>, ApiError> {
    require_role(&actor, Role::Merchant, "list brands")?;
    Ok(Json(state.catalog.list_brands().await?))
}

/// GET /v1/merchant/brand/{id}
pub async fn get_brand<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Brand>, ApiError> {
    require_role(&actor, Role::Merchant, "view brand")?;
    let id = parse_id(&id, BrandId::parse)?;
    Ok(Json(state.catalog.find_brand(id).await?))
}
