//! Checkout: turn the identity's cart into an order.
//!
//! The cart is either open (it exists, possibly empty) or closed (deleted,
//! with an order in its place). The store performs the transition in one
//! unit of work, so callers never observe an order with a subset of the
//! cart's items or a half-emptied cart.

use tracing::instrument;

use souq_core::Identity;

use super::{CommerceError, OrderSummary};
use crate::db::Store;
use crate::models::ShippingDetails;

/// Checkout orchestration.
pub struct Checkout<'a> {
    store: &'a dyn Store,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order for everything in the identity's cart, then delete it.
    ///
    /// Shipping details arrive validated; they are not re-checked here.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::EmptyCart` (with no state change) if the
    /// identity has no cart or the cart has no items, and
    /// `CommerceError::Storage` if the transaction fails.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn checkout(
        &self,
        owner: &Identity,
        shipping: &ShippingDetails,
    ) -> Result<OrderSummary, CommerceError> {
        let order = self
            .store
            .place_order(owner, shipping)
            .await?
            .ok_or(CommerceError::EmptyCart)?;

        let lines = self.store.order_lines(&[order.id]).await?;
        let summary = OrderSummary::new(order, lines);

        tracing::info!(
            order_id = %summary.order.id,
            lines = summary.lines.len(),
            total = %summary.total,
            "checkout complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souq_core::GuestToken;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::test_support::product;
    use crate::services::{CartManager, OrderQuery};

    fn shipping() -> ShippingDetails {
        ShippingDetails::parse("Layla", "+20 100 000 0000", "12 Nile St, Cairo").unwrap()
    }

    #[tokio::test]
    async fn test_checkout_without_cart_is_empty_cart() {
        let store = MemoryStore::new();
        let owner = Identity::Guest(GuestToken::generate());

        let result = Checkout::new(&store).checkout(&owner, &shipping()).await;
        assert!(matches!(result, Err(CommerceError::EmptyCart)));
        assert!(OrderQuery::new(&store).list_orders(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_changes_nothing() {
        let store = MemoryStore::new();
        let owner = Identity::Guest(GuestToken::generate());
        let carts = CartManager::new(&store);
        let cart = carts.resolve_cart(&owner).await.unwrap();

        let result = Checkout::new(&store).checkout(&owner, &shipping()).await;
        assert!(matches!(result, Err(CommerceError::EmptyCart)));

        // The open cart survives and no order exists.
        assert_eq!(carts.find_cart(&owner).await.unwrap().map(|c| c.id), Some(cart.id));
        assert!(OrderQuery::new(&store).list_orders(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_deletes_cart() {
        let store = MemoryStore::new();
        let owner = Identity::Guest(GuestToken::generate());
        let carts = CartManager::new(&store);
        let a = product(&store, "A", "10.00").await;
        let b = product(&store, "B", "5.00").await;

        let cart = carts.resolve_cart(&owner).await.unwrap();
        carts.add_item(&cart, a.id, 1).await.unwrap();
        carts.add_item(&cart, a.id, 1).await.unwrap();
        carts.add_item(&cart, b.id, 1).await.unwrap();

        let placed = Checkout::new(&store).checkout(&owner, &shipping()).await.unwrap();
        assert_eq!(placed.lines.len(), 2);
        assert_eq!(placed.total, "25.00".parse().unwrap());
        assert_eq!(placed.order.customer_name, "Layla");
        assert_eq!(placed.order.owner, owner);

        let quantities: Vec<(souq_core::ProductId, i32)> = placed
            .lines
            .iter()
            .map(|line| (line.product.id, line.item.quantity))
            .collect();
        assert_eq!(quantities, vec![(a.id, 2), (b.id, 1)]);

        // The cart is gone; resolving again yields a new, empty cart.
        assert!(carts.find_cart(&owner).await.unwrap().is_none());
        let fresh = carts.resolve_cart(&owner).await.unwrap();
        assert_ne!(fresh.id, cart.id);
        assert!(carts.summary(&fresh).await.unwrap().is_empty());

        let orders = OrderQuery::new(&store).list_orders(&owner).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order.id, placed.order.id);
    }

    #[tokio::test]
    async fn test_new_order_is_listed_first_and_prior_order_kept() {
        let store = MemoryStore::new();
        let owner = Identity::Guest(GuestToken::generate());
        let carts = CartManager::new(&store);
        let checkout = Checkout::new(&store);
        let tea = product(&store, "Tea", "2.50").await;

        let cart = carts.resolve_cart(&owner).await.unwrap();
        carts.add_item(&cart, tea.id, 1).await.unwrap();
        let first = checkout.checkout(&owner, &shipping()).await.unwrap();

        let cart = carts.resolve_cart(&owner).await.unwrap();
        carts.add_item(&cart, tea.id, 4).await.unwrap();
        let second = checkout.checkout(&owner, &shipping()).await.unwrap();

        let orders = OrderQuery::new(&store).list_orders(&owner).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![second.order.id, first.order.id]);
        assert_eq!(orders[1].total, "2.50".parse().unwrap());
        assert_eq!(orders[0].total, "10.00".parse().unwrap());
    }
}
