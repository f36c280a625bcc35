//! Cart queries.
//!
//! Uniqueness is enforced by the database: partial unique indexes on
//! `carts.user_id` / `carts.guest_token` and a unique `(cart_id, product_id)`
//! on `cart_items`. Writers rely on `ON CONFLICT` instead of check-then-insert.
//! Line writes share-lock their cart so they cannot interleave with checkout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use souq_core::{CartId, CartItemId, Identity, ProductId, Quantity, UserId};

use super::products::{LineRow, line_columns};
use super::{
    CartRepository, PgStore, RepositoryError, map_write_error, owner_columns, owner_from_columns,
};
use crate::models::{Cart, CartItem, CartLine};

/// How often `find_or_create_cart` retries when the conflicting cart vanished
/// (checked out) between the insert and the re-select.
const CART_CREATE_ATTEMPTS: usize = 3;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    guest_token: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: owner_from_columns(row.user_id, row.guest_token)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

impl PgStore {
    async fn select_cart(&self, owner: &Identity) -> Result<Option<Cart>, RepositoryError> {
        let (user_id, guest_token) = owner_columns(owner);
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, guest_token, created_at
            FROM storefront.carts
            WHERE user_id = $1 OR guest_token = $2
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .fetch_optional(self.pool())
        .await?;

        row.map(Cart::try_from).transpose()
    }
}

/// Share-lock a cart row for the rest of the transaction. Returns `false`
/// when the cart does not exist.
///
/// An increment of an existing line never touches the cart row, so the
/// foreign key alone does not order it against checkout's `FOR UPDATE`.
/// While a checkout holds the cart this waits, then sees it deleted.
async fn lock_cart_shared(
    tx: &mut Transaction<'_, Postgres>,
    cart_id: CartId,
) -> Result<bool, RepositoryError> {
    let row: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM storefront.carts WHERE id = $1 FOR SHARE")
            .bind(cart_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.is_some())
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>, RepositoryError> {
        self.select_cart(owner).await
    }

    async fn find_or_create_cart(&self, owner: &Identity) -> Result<Cart, RepositoryError> {
        let (user_id, guest_token) = owner_columns(owner);

        for _ in 0..CART_CREATE_ATTEMPTS {
            let inserted = sqlx::query_as::<_, CartRow>(
                r"
                INSERT INTO storefront.carts (user_id, guest_token)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                RETURNING id, user_id, guest_token, created_at
                ",
            )
            .bind(user_id)
            .bind(guest_token)
            .fetch_optional(self.pool())
            .await?;

            if let Some(row) = inserted {
                let cart = Cart::try_from(row)?;
                tracing::debug!(cart_id = %cart.id, owner = %owner, "created cart");
                return Ok(cart);
            }

            // Someone else holds the slot; return their cart.
            if let Some(cart) = self.select_cart(owner).await? {
                return Ok(cart);
            }
        }

        Err(RepositoryError::Conflict(format!(
            "cart for {owner} kept disappearing during creation"
        )))
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {}
            FROM storefront.cart_items ci
            JOIN storefront.products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
            line_columns("ci", "cart_id")
        );
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(cart_id)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CartLine {
                product: row.product(),
                item: CartItem {
                    id: CartItemId::new(row.item_id),
                    cart_id: CartId::new(row.parent_id),
                    product_id: row.product_id,
                    quantity: row.quantity,
                },
            })
            .collect())
    }

    async fn add_to_cart(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        if !lock_cart_shared(&mut tx, cart_id).await? {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO storefront.cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = storefront.cart_items.quantity + EXCLUDED.quantity
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(delta.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn remove_from_cart(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        if !lock_cart_shared(&mut tx, cart_id).await? {
            return Ok(false);
        }

        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_items
            WHERE id = $1 AND cart_id = $2
            ",
        )
        .bind(item_id)
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
