//! Order API: checkout and history.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::{OrderId, OrderItemId, Price};

use super::ApiResult;
use crate::middleware::CurrentIdentity;
use crate::models::{OrderLine, Product, ShippingDetails};
use crate::services::{Checkout, CommerceError, OrderQuery, OrderSummary};
use crate::state::AppState;

/// An order line as returned by the API, priced at the current product price.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: i32,
    pub total_price: Price,
}

impl From<OrderLine> for OrderItemResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.item.id,
            total_price: line.line_total(),
            quantity: line.item.quantity,
            product: line.product,
        }
    }
}

/// An order as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<OrderItemResponse>,
    pub total: Price,
}

impl From<OrderSummary> for OrderResponse {
    fn from(summary: OrderSummary) -> Self {
        let order = summary.order;
        Self {
            id: order.id,
            created_at: order.created_at,
            customer_name: order.customer_name,
            phone: order.phone,
            address: order.address,
            items: summary.lines.into_iter().map(OrderItemResponse::from).collect(),
            total: summary.total,
        }
    }
}

/// Checkout request body. Missing fields read as blank and fail validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// The caller's orders, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = OrderQuery::new(state.store()).list_orders(&owner).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Check out the caller's cart.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let shipping = ShippingDetails::parse(&body.customer_name, &body.phone, &body.address)
        .map_err(|e| CommerceError::Validation(e.to_string()))?;
    let placed = Checkout::new(state.store()).checkout(&owner, &shipping).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// One of the caller's orders.
#[instrument(skip(state, owner))]
pub async fn show(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    Path(id): Path<OrderId>,
) -> ApiResult<Json<OrderResponse>> {
    let summary = OrderQuery::new(state.store()).get_order(&owner, id).await?;
    Ok(Json(summary.into()))
}
