//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentIdentity, PageContext, push_flash};
use crate::models::{Flash, ShippingDetails};
use crate::services::{CartManager, CartSummary, Checkout, CommerceError};
use crate::state::AppState;

/// Shipping form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Checkout page template: cart recap plus the shipping form.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartSummary,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

async fn redirect_empty_cart(session: &Session) -> Result<Response> {
    push_flash(session, Flash::error("Your cart is empty")).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Display the shipping form, or send the customer back to an empty cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(owner): CurrentIdentity,
    page: PageContext,
) -> Result<Response> {
    let cart = CartManager::new(state.store()).current_cart(&owner).await?;
    if cart.is_empty() {
        return redirect_empty_cart(&session).await;
    }

    Ok(CheckoutTemplate {
        page,
        cart,
        form: CheckoutForm::default(),
        error: None,
    }
    .into_response())
}

/// Place the order.
///
/// Invalid shipping details re-render the form with the customer's input.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(owner): CurrentIdentity,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let shipping = match ShippingDetails::parse(&form.customer_name, &form.phone, &form.address) {
        Ok(shipping) => shipping,
        Err(e) => {
            let cart = CartManager::new(state.store()).current_cart(&owner).await?;
            let template = CheckoutTemplate {
                page,
                cart,
                form,
                error: Some(e.to_string()),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    match Checkout::new(state.store()).checkout(&owner, &shipping).await {
        Ok(placed) => {
            push_flash(
                &session,
                Flash::success(format!("Order #{} placed. Thank you!", placed.order.id)),
            )
            .await?;
            Ok(Redirect::to("/orders").into_response())
        }
        Err(CommerceError::EmptyCart) => redirect_empty_cart(&session).await,
        Err(e) => Err(AppError::from(e)),
    }
}
