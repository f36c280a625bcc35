//! Order queries and the checkout transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use souq_core::{CartId, Identity, OrderId, OrderItemId, UserId};

use super::products::{LineRow, line_columns};
use super::{OrderRepository, PgStore, RepositoryError, owner_columns, owner_from_columns};
use crate::models::{Order, OrderItem, OrderLine, ShippingDetails};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    guest_token: Option<Uuid>,
    customer_name: String,
    phone: String,
    address: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: owner_from_columns(row.user_id, row.guest_token)?,
            customer_name: row.customer_name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(
        &self,
        owner: &Identity,
        shipping: &ShippingDetails,
    ) -> Result<Option<Order>, RepositoryError> {
        let (user_id, guest_token) = owner_columns(owner);
        let mut tx = self.pool().begin().await?;

        // Lock the cart. Line writes take a share lock on it, so they either
        // commit before this point or wait and then fail on the deleted cart.
        let cart_id: Option<CartId> = sqlx::query_scalar(
            r"
            SELECT id FROM storefront.carts
            WHERE user_id = $1 OR guest_token = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(cart_id) = cart_id else {
            return Ok(None);
        };

        let item_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.cart_items WHERE cart_id = $1")
                .bind(cart_id)
                .fetch_one(&mut *tx)
                .await?;

        if item_count == 0 {
            return Ok(None);
        }

        let order = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.orders (user_id, guest_token, customer_name, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, guest_token, customer_name, phone, address, created_at
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .bind(shipping.customer_name())
        .bind(shipping.phone())
        .bind(shipping.address())
        .fetch_one(&mut *tx)
        .await?;
        let order = Order::try_from(order)?;

        sqlx::query(
            r"
            INSERT INTO storefront.order_items (order_id, product_id, quantity)
            SELECT $1, product_id, quantity
            FROM storefront.cart_items
            WHERE cart_id = $2
            ORDER BY id
            ",
        )
        .bind(order.id)
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

        // Explicit cascade: items first, then the cart itself.
        sqlx::query("DELETE FROM storefront.cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM storefront.carts WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, %cart_id, items = item_count, "placed order");
        Ok(Some(order))
    }

    async fn list_orders(&self, owner: &Identity) -> Result<Vec<Order>, RepositoryError> {
        let (user_id, guest_token) = owner_columns(owner);
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, guest_token, customer_name, phone, address, created_at
            FROM storefront.orders
            WHERE user_id = $1 OR guest_token = $2
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_order(
        &self,
        owner: &Identity,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let (user_id, guest_token) = owner_columns(owner);
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, guest_token, customer_name, phone, address, created_at
            FROM storefront.orders
            WHERE id = $1 AND (user_id = $2 OR guest_token = $3)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(guest_token)
        .fetch_optional(self.pool())
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let sql = format!(
            r"
            SELECT {}
            FROM storefront.order_items oi
            JOIN storefront.products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.id
            ",
            line_columns("oi", "order_id")
        );
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderLine {
                product: row.product(),
                item: OrderItem {
                    id: OrderItemId::new(row.item_id),
                    order_id: OrderId::new(row.parent_id),
                    product_id: row.product_id,
                    quantity: row.quantity,
                },
            })
            .collect())
    }
}
