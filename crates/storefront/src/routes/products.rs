//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use souq_core::ProductId;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Product;
use crate::services::Catalog;
use crate::state::AppState;

/// Product detail template with the add-to-cart form.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
}

/// Display one product.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let product = Catalog::new(state.store()).product(id).await?;
    Ok(ProductShowTemplate { page, product })
}
