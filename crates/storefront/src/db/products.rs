//! Product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use souq_core::{Price, ProductId};

use super::{PgStore, ProductRepository, RepositoryError, map_write_error};

/// `PostgreSQL` `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
use crate::models::{NewProduct, Product};

/// Column list matching [`ProductRow`].
pub(super) const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.price, p.stock, p.image, p.created_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
    stock: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

/// A line item row joined with its product, shared by cart and order lines.
///
/// Product columns are prefixed `product_` to keep them apart from the item's.
#[derive(sqlx::FromRow)]
pub(super) struct LineRow {
    pub item_id: i32,
    pub parent_id: i32,
    pub quantity: i32,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_description: String,
    pub product_price: Price,
    pub product_stock: i32,
    pub product_image: Option<String>,
    pub product_created_at: DateTime<Utc>,
}

/// Select list for [`LineRow`], given the item table alias.
pub(super) fn line_columns(item: &str, parent_column: &str) -> String {
    format!(
        "{item}.id AS item_id, {item}.{parent_column} AS parent_id, {item}.quantity, \
         p.id AS product_id, p.name AS product_name, p.description AS product_description, \
         p.price AS product_price, p.stock AS product_stock, p.image AS product_image, \
         p.created_at AS product_created_at"
    )
}

impl LineRow {
    pub(super) fn product(&self) -> Product {
        Product {
            id: self.product_id,
            name: self.product_name.clone(),
            description: self.product_description.clone(),
            price: self.product_price,
            stock: self.product_stock,
            image: self.product_image.clone(),
            created_at: self.product_created_at,
        }
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products p ORDER BY p.id DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.products AS p (name, description, price, stock, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING p.id, p.name, p.description, p.price, p.stock, p.image, p.created_at
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.image.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE storefront.products AS p
            SET name = $2, description = $3, price = $4, stock = $5, image = $6
            WHERE p.id = $1
            RETURNING p.id, p.name, p.description, p.price, p.stock, p.image, p.created_at
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.image.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Explicit cascade: cart lines first. Order items restrict the delete,
        // which rolls these back too.
        let cart_lines = sqlx::query("DELETE FROM storefront.cart_items WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM storefront.products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
                {
                    return RepositoryError::Conflict(format!(
                        "product {id} appears in orders"
                    ));
                }
                RepositoryError::Database(e)
            })?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(product_id = %id, cart_lines, "deleted product");
        }
        Ok(deleted)
    }
}
