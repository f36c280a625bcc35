//! Cart route handlers.
//!
//! Mutations are plain form posts that redirect back to the cart page with a
//! flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use souq_core::{CartItemId, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CurrentIdentity, PageContext, push_flash};
use crate::models::Flash;
use crate::services::{CartManager, CartSummary, CommerceError};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartSummary,
}

/// Display cart page. Does not create a cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    CurrentIdentity(owner): CurrentIdentity,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cart = CartManager::new(state.store()).current_cart(&owner).await?;
    Ok(CartShowTemplate { page, cart })
}

/// Add a product to the cart, creating the cart if needed.
///
/// An invalid quantity sends the customer back to the product page.
#[instrument(skip(state, session, owner))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(owner): CurrentIdentity,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);

    match CartManager::new(state.store())
        .add_item_for(&owner, form.product_id, quantity)
        .await
    {
        Ok(line) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[
                    ("product_id", form.product_id.to_string()),
                    ("quantity", quantity.to_string()),
                ],
            );
            push_flash(
                &session,
                Flash::success(format!("Added {} to your cart", line.product.name)),
            )
            .await?;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(CommerceError::Validation(message)) => {
            push_flash(&session, Flash::error(message)).await?;
            Ok(Redirect::to(&format!("/products/{}", form.product_id)).into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Remove a line from the caller's cart.
#[instrument(skip(state, session, owner))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(owner): CurrentIdentity,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    CartManager::new(state.store())
        .remove_item_for(&owner, form.item_id)
        .await?;
    push_flash(&session, Flash::success("Item removed from your cart")).await?;
    Ok(Redirect::to("/cart"))
}
