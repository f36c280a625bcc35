//! Order history page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{CurrentIdentity, PageContext};
use crate::services::{OrderQuery, OrderSummary};
use crate::state::AppState;

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderSummary>,
}

/// Display the caller's orders, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderQuery::new(state.store()).list_orders(&owner).await?;
    Ok(OrdersTemplate { page, orders })
}
