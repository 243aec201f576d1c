//! Endpoints for signed-in customers: profile and orders.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Order, OrderId, Role, User};
use domain::{
    ListingParams, OrderFilter, OrderListing, OrderRequest, RequestedTransition, authorize_order,
    require_role,
};
use store::ShopStore;

use super::{StatusUpdate, StatusUpdated, parse_id};
use crate::error::ApiError;
use crate::extract::AuthenticatedActor;
use crate::state::AppState;

/// GET /v1/user: the caller's own profile.
#[tracing::instrument(skip(state))]
pub async fn profile<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.catalog.get_profile(actor).await?))
}

/// POST /v1/user/order: place an order.
#[tracing::instrument(skip(state, body))]
pub async fn create_order<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = body?;
    let order = state.orders.create_order(actor, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/user/order: the caller's orders, newest first.
#[tracing::instrument(skip(state, params))]
pub async fn list_orders<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<OrderListing>, ApiError> {
    require_role(&actor, Role::Customer, "list orders")?;
    let Query(params) = params?;
    let filter = OrderFilter::from_params(&params)?;
    Ok(Json(state.catalog.list_orders(actor, &filter).await?))
}

/// GET /v1/user/order/{id}
#[tracing::instrument(skip(state))]
pub async fn get_order<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&id, OrderId::parse)?;
    Ok(Json(state.orders.get_order(actor, id).await?))
}

/// PATCH /v1/user/order/{id}: request a status change (cancellation).
#[tracing::instrument(skip(state, body))]
pub async fn update_order<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<StatusUpdated>, ApiError> {
    let id = parse_id(&id, OrderId::parse)?;
    let Json(update) = body?;
    let transition = RequestedTransition::parse_for_order(&update.status)?;
    let requested = authorize_order(actor.role, transition)?;

    let previous = state
        .orders
        .update_order_status(actor, id, requested)
        .await?;

    Ok(Json(StatusUpdated {
        id: id.to_string(),
        status: requested.to_string(),
        previous_status: previous.to_string(),
    }))
}
