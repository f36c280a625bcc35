//! Persistence for the storefront.
//!
//! # Repositories
//!
//! Storage is reached only through the repository traits below, so every
//! write the commerce services make (including cascades) is explicit:
//!
//! - [`ProductRepository`] - catalog reads, product upkeep for operators
//! - [`CartRepository`] - one cart per identity, line item upserts
//! - [`OrderRepository`] - transactional checkout and order reads
//! - [`UserRepository`] - password accounts
//!
//! [`Store`] bundles them. [`PgStore`] is the `PostgreSQL` implementation;
//! [`memory::MemoryStore`] keeps everything in process for tests and demos.
//!
//! # Tables (schema `storefront`)
//!
//! - `products`
//! - `carts` - owned by exactly one of `user_id` / `guest_token`, unique per owner
//! - `cart_items` - unique `(cart_id, product_id)`, cascade from `carts` and `products`
//! - `orders`
//! - `order_items` - cascade from `orders`, restrict on `products`
//! - `users`
//! - `tower_sessions.session` - created by `souq-cli migrate`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p souq-cli -- migrate
//! ```

mod carts;
pub mod memory;
mod orders;
mod products;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use souq_core::{CartId, CartItemId, Email, Identity, OrderId, ProductId, Quantity, UserId};

use crate::models::{
    Cart, CartItem, CartLine, NewProduct, Order, OrderLine, Product, ShippingDetails, User,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced entity does not exist.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read access to the catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Overwrite a product's fields. `None` when no product has this id.
    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product together with the cart lines holding it. Returns
    /// whether a product was deleted.
    ///
    /// Fails with `Conflict` (and deletes nothing) while any order
    /// references the product.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Carts and their items.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The identity's cart, if one exists. Never creates.
    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>, RepositoryError>;

    /// Atomic insert-if-absent: concurrent callers for one identity all
    /// receive the same cart.
    async fn find_or_create_cart(&self, owner: &Identity) -> Result<Cart, RepositoryError>;

    /// Items of a cart with their products, in insertion order.
    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Insert a line or increment the existing `(cart, product)` line.
    ///
    /// Fails with `NotFound` when the product or the cart does not exist.
    async fn add_to_cart(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Delete an item only if it belongs to `cart_id`. Returns whether a row
    /// was deleted.
    async fn remove_from_cart(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError>;
}

/// Orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Convert the owner's cart into an order in one unit of work: create the
    /// order, copy every cart item into an order item, delete the cart items
    /// and then the cart.
    ///
    /// Returns `None` (and changes nothing) when the owner has no cart or the
    /// cart is empty.
    async fn place_order(
        &self,
        owner: &Identity,
        shipping: &ShippingDetails,
    ) -> Result<Option<Order>, RepositoryError>;

    /// The owner's orders, newest first (ties broken by id, descending).
    async fn list_orders(&self, owner: &Identity) -> Result<Vec<Order>, RepositoryError>;

    /// One of the owner's orders. Orders of other identities are `None`.
    async fn get_order(
        &self,
        owner: &Identity,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Items of the given orders with their products, grouped by order.
    async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError>;
}

/// Password accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, email: &Email, password_hash: &str)
    -> Result<User, RepositoryError>;

    /// The user and their password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

/// Everything the storefront needs from storage.
#[async_trait]
pub trait Store: ProductRepository + CartRepository + OrderRepository + UserRepository {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Split an identity into its `(user_id, guest_token)` column values.
///
/// Exactly one is `Some`. Queries match owners with
/// `user_id = $1 OR guest_token = $2`; the `NULL` side never matches.
const fn owner_columns(owner: &Identity) -> (Option<UserId>, Option<Uuid>) {
    match owner {
        Identity::User(id) => (Some(*id), None),
        Identity::Guest(token) => (None, Some(token.as_uuid())),
    }
}

/// Rebuild an owner from its two columns.
fn owner_from_columns(
    user_id: Option<UserId>,
    guest_token: Option<Uuid>,
) -> Result<Identity, RepositoryError> {
    Identity::from_columns(user_id, guest_token).ok_or_else(|| {
        RepositoryError::DataCorruption("row must have exactly one owner column set".to_owned())
    })
}

/// Map write errors caused by client input to domain-level repository errors.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
        // numeric_value_out_of_range
        if db_err.code().as_deref() == Some("22003") {
            return RepositoryError::Conflict("value out of range".to_owned());
        }
    }
    RepositoryError::Database(e)
}
