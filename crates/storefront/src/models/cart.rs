//! Carts and their line items.

use chrono::{DateTime, Utc};

use souq_core::{CartId, CartItemId, Identity, Price, ProductId};

use super::Product;

/// The pre-purchase basket of one identity.
///
/// At most one cart exists per identity; it is created on first use and
/// deleted when checkout succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub owner: Identity,
    pub created_at: DateTime<Utc>,
}

/// One product in a cart. `(cart_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A cart item joined with its product.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    /// `product.price × quantity`, at the current catalog price.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.item.quantity)
    }
}
