//! Read-only product API.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use souq_core::ProductId;

use super::ApiResult;
use crate::models::Product;
use crate::services::Catalog;
use crate::state::AppState;

/// List products, newest first.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(Catalog::new(state.store()).list_products().await?))
}

/// One product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> ApiResult<Json<Product>> {
    Ok(Json(Catalog::new(state.store()).product(id).await?))
}
