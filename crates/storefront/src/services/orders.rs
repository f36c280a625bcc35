//! Order history.
//!
//! Totals are recomputed from current product prices every time an order is
//! read; order items only record quantities.

use std::collections::HashMap;

use tracing::instrument;

use souq_core::{Identity, OrderId, Price};

use super::CommerceError;
use crate::db::Store;
use crate::models::{Order, OrderLine};

/// An order with its lines and total.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: Price,
}

impl OrderSummary {
    #[must_use]
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        let total = lines.iter().map(OrderLine::line_total).sum();
        Self {
            order,
            lines,
            total,
        }
    }
}

/// Read access to an identity's orders.
pub struct OrderQuery<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderQuery<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All of the identity's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the store fails.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn list_orders(&self, owner: &Identity) -> Result<Vec<OrderSummary>, CommerceError> {
        let orders = self.store.list_orders(owner).await?;
        let ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();

        let mut lines_by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for line in self.store.order_lines(&ids).await? {
            lines_by_order
                .entry(line.item.order_id)
                .or_default()
                .push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                OrderSummary::new(order, lines)
            })
            .collect())
    }

    /// One of the identity's orders.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the order does not exist or
    /// belongs to another identity.
    #[instrument(skip_all, fields(owner = %owner, order_id = %id))]
    pub async fn get_order(
        &self,
        owner: &Identity,
        id: OrderId,
    ) -> Result<OrderSummary, CommerceError> {
        let order = self
            .store
            .get_order(owner, id)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("order {id}")))?;
        let lines = self.store.order_lines(&[order.id]).await?;
        Ok(OrderSummary::new(order, lines))
    }
}
