//! Public catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use common::{Product, ProductId};
use domain::{ListingParams, ProductFilter};
use store::{Page, ShopStore};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /v1/common/product: public product listing.
#[tracing::instrument(skip(state, params))]
pub async fn list_products<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Page<Product>>, ApiError> {
    let Query(params) = params?;
    let filter = ProductFilter::from_params(&params)?;
    Ok(Json(state.catalog.list_products(&filter, None).await?))
}

/// GET /v1/common/product/{id}
#[tracing::instrument(skip(state))]
pub async fn get_product<S: ShopStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id, ProductId::parse)?;
    Ok(Json(state.catalog.get_product(id).await?))
}
