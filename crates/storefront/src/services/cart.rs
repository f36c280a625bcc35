//! Cart management.
//!
//! Each identity has at most one cart. It is created lazily by
//! [`CartManager::resolve_cart`] and deleted by checkout. Read paths use
//! [`CartManager::current_cart`], which never creates one.

use tracing::instrument;

use souq_core::{CartId, CartItemId, Identity, Price, ProductId, Quantity};

use super::CommerceError;
use crate::db::{RepositoryError, Store};
use crate::models::{Cart, CartLine, Product};

/// A cart with its lines and total, as shown to the customer.
#[derive(Debug, Clone)]
pub struct CartSummary {
    /// `None` when the identity has no cart yet.
    pub cart_id: Option<CartId>,
    pub lines: Vec<CartLine>,
    pub total: Price,
}

impl CartSummary {
    /// The view of an identity without a cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cart_id: None,
            lines: Vec::new(),
            total: Price::ZERO,
        }
    }

    fn from_lines(cart_id: CartId, lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Self {
            cart_id: Some(cart_id),
            lines,
            total,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.item.quantity)).sum()
    }
}

/// Cart operations for one request.
pub struct CartManager<'a> {
    store: &'a dyn Store,
}

impl<'a> CartManager<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Return the identity's cart, creating an empty one if absent.
    ///
    /// Idempotent: repeated and concurrent calls yield the same cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn resolve_cart(&self, owner: &Identity) -> Result<Cart, CommerceError> {
        Ok(self.store.find_or_create_cart(owner).await?)
    }

    /// The identity's cart, if any. Never creates one.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    pub async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>, CommerceError> {
        Ok(self.store.find_cart(owner).await?)
    }

    /// Read-only view of the identity's cart; empty when there is none.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn current_cart(&self, owner: &Identity) -> Result<CartSummary, CommerceError> {
        match self.store.find_cart(owner).await? {
            Some(cart) => self.summary(&cart).await,
            None => Ok(CartSummary::empty()),
        }
    }

    /// Lines and total of a cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    pub async fn summary(&self, cart: &Cart) -> Result<CartSummary, CommerceError> {
        let lines = self.store.cart_lines(cart.id).await?;
        Ok(CartSummary::from_lines(cart.id, lines))
    }

    /// Sum of `price × quantity` over the cart's lines.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    pub async fn cart_total(&self, cart: &Cart) -> Result<Price, CommerceError> {
        Ok(self.summary(cart).await?.total)
    }

    /// Add `delta` units of a product, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Validation` if `delta` is outside `1..=9999`,
    /// `CommerceError::NotFound` if the product does not exist (or the cart
    /// was checked out concurrently).
    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn add_item(
        &self,
        cart: &Cart,
        product_id: ProductId,
        delta: i32,
    ) -> Result<CartLine, CommerceError> {
        let delta = validate_delta(delta)?;
        let product = self.product(product_id).await?;
        self.add_line(cart, product, delta).await
    }

    /// Add `delta` units of a product to the identity's cart.
    ///
    /// The cart is resolved only after the quantity and product check out,
    /// so a rejected request never leaves an empty cart behind.
    ///
    /// # Errors
    ///
    /// As [`CartManager::add_item`].
    #[instrument(skip_all, fields(owner = %owner, product_id = %product_id))]
    pub async fn add_item_for(
        &self,
        owner: &Identity,
        product_id: ProductId,
        delta: i32,
    ) -> Result<CartLine, CommerceError> {
        let delta = validate_delta(delta)?;
        let product = self.product(product_id).await?;
        let cart = self.resolve_cart(owner).await?;
        self.add_line(&cart, product, delta).await
    }

    async fn product(&self, id: ProductId) -> Result<Product, CommerceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("product {id}")))
    }

    async fn add_line(
        &self,
        cart: &Cart,
        product: Product,
        delta: Quantity,
    ) -> Result<CartLine, CommerceError> {
        let item = self
            .store
            .add_to_cart(cart.id, product.id, delta)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::NotFound(format!("cart {}", cart.id)),
                RepositoryError::Conflict(_) => {
                    CommerceError::Validation("quantity is too large".to_owned())
                }
                other => CommerceError::Storage(other),
            })?;

        tracing::debug!(item_id = %item.id, quantity = item.quantity, "cart line updated");
        Ok(CartLine { item, product })
    }

    /// Remove an item from a cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` unless the item belongs to `cart`;
    /// the cart is left unchanged in that case.
    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn remove_item(&self, cart: &Cart, item_id: CartItemId) -> Result<(), CommerceError> {
        if self.store.remove_from_cart(cart.id, item_id).await? {
            Ok(())
        } else {
            Err(CommerceError::NotFound(format!("cart item {item_id}")))
        }
    }

    /// Remove an item from the identity's cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the identity has no cart or the
    /// item is not in it.
    pub async fn remove_item_for(
        &self,
        owner: &Identity,
        item_id: CartItemId,
    ) -> Result<(), CommerceError> {
        let cart = self
            .find_cart(owner)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("cart item {item_id}")))?;
        self.remove_item(&cart, item_id).await
    }
}

fn validate_delta(delta: i32) -> Result<Quantity, CommerceError> {
    Quantity::new(delta).map_err(|e| CommerceError::Validation(e.to_string()))
}
