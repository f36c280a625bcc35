//! JSON API.
//!
//! ```text
//! GET    /api/products              - Product list, newest first
//! GET    /api/products/{id}         - One product
//! GET    /api/cart                  - The caller's cart (empty if none)
//! POST   /api/cart/items            - Add {productId, quantity?}
//! DELETE /api/cart/items/{id}       - Remove a line (204)
//! GET    /api/orders                - The caller's orders, newest first
//! POST   /api/orders                - Checkout {customerName, phone, address} (201)
//! GET    /api/orders/{id}           - One of the caller's orders
//! ```
//!
//! Field names are camelCase. Errors share one shape:
//! `{"error": "<code>", "message": "<text>", "status": <u16>}`.

pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
}

/// An [`AppError`] rendered as JSON.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.report();
        let status = err.status();
        let body = ErrorBody {
            error: err.code(),
            message: err.public_message(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Create the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/cart", get(cart::show))
        .route("/cart/items", post(cart::add_item))
        .route("/cart/items/{id}", delete(cart::remove_item))
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/{id}", get(orders::show))
}
