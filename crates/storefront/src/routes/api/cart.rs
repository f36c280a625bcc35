//! Cart API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::{CartId, CartItemId, Price, ProductId};

use super::ApiResult;
use crate::middleware::CurrentIdentity;
use crate::models::{CartLine, Product};
use crate::services::{CartManager, CartSummary};
use crate::state::AppState;

/// A cart line as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: i32,
    pub total_price: Price,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.item.id,
            total_price: line.line_total(),
            quantity: line.item.quantity,
            product: line.product,
        }
    }
}

/// The caller's cart. `id` is null until the first item is added.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: Option<CartId>,
    pub items: Vec<CartItemResponse>,
    pub total: Price,
}

impl From<CartSummary> for CartResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            id: summary.cart_id,
            items: summary.lines.into_iter().map(CartItemResponse::from).collect(),
            total: summary.total,
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
}

/// The caller's cart. Does not create one.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
) -> ApiResult<Json<CartResponse>> {
    let summary = CartManager::new(state.store()).current_cart(&owner).await?;
    Ok(Json(summary.into()))
}

/// Add a product to the caller's cart, creating the cart if the request is valid.
#[instrument(skip(state, owner))]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<Json<CartItemResponse>> {
    let line = CartManager::new(state.store())
        .add_item_for(&owner, body.product_id, body.quantity.unwrap_or(1))
        .await?;
    Ok(Json(line.into()))
}

/// Remove a line from the caller's cart.
#[instrument(skip(state, owner))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    Path(id): Path<CartItemId>,
) -> ApiResult<StatusCode> {
    CartManager::new(state.store())
        .remove_item_for(&owner, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
