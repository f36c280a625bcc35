//! Catalog management commands.
//!
//! Products are only created by operators; the storefront exposes them
//! read-only.
//!
//! # Usage
//!
//! ```bash
//! souq-cli product add --name "Mint tea" --price 4.50 --stock 20
//! souq-cli product edit 12 --price 5.00
//! souq-cli product delete 12
//! souq-cli product list
//! ```

use souq_core::{Price, ProductId};
use souq_storefront::db::PgStore;
use souq_storefront::models::Product;
use souq_storefront::services::{Catalog, ProductChanges};

use super::{CommandError, connect};

/// Create a product.
///
/// # Errors
///
/// Returns an error for an invalid price, name or stock, or if the insert fails.
pub async fn add(
    name: &str,
    price: &str,
    stock: i32,
    description: &str,
) -> Result<Product, CommandError> {
    let price: Price = price.parse()?;
    let store = PgStore::new(connect().await?);

    let product = Catalog::new(&store)
        .create_product(name, description, price, stock)
        .await?;

    tracing::info!(
        "Product created! ID: {}, Name: {}, Price: {}",
        product.id.to_string(),
        product.name,
        product.price.display()
    );
    Ok(product)
}

/// Raw `product edit` arguments; `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i32>,
    pub description: Option<String>,
}

impl ProductEdit {
    fn into_changes(self) -> Result<ProductChanges, CommandError> {
        Ok(ProductChanges {
            name: self.name,
            description: self.description,
            price: self.price.as_deref().map(str::parse::<Price>).transpose()?,
            stock: self.stock,
        })
    }
}

/// Change fields of an existing product.
///
/// # Errors
///
/// Returns an error for an unknown product or invalid values, or if the
/// update fails.
pub async fn edit(id: i32, edit: ProductEdit) -> Result<Product, CommandError> {
    let changes = edit.into_changes()?;
    let store = PgStore::new(connect().await?);

    let product = Catalog::new(&store)
        .update_product(ProductId::new(id), changes)
        .await?;

    tracing::info!("Product updated: {}", format_row(&product));
    Ok(product)
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error if the product does not exist or has been ordered.
pub async fn delete(id: i32) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    Catalog::new(&store).delete_product(ProductId::new(id)).await?;

    tracing::info!("Product {id} deleted");
    Ok(())
}

/// Print every product, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    let products = Catalog::new(&store).list_products().await?;

    #[allow(clippy::print_stdout)]
    {
        if products.is_empty() {
            println!("No products.");
        }
        for product in &products {
            println!("{}", format_row(product));
        }
    }
    Ok(())
}

/// One line of `product list` output.
fn format_row(product: &Product) -> String {
    format!(
        "{:>6}  {:<40}  {:>12}  stock {}",
        product.id.to_string(),
        product.name,
        product.price.display(),
        product.stock
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row() {
        let product = Product {
            id: ProductId::new(12),
            name: "Mint tea".to_string(),
            description: String::new(),
            price: "4.5".parse().unwrap(),
            stock: 20,
            image: None,
            created_at: chrono::Utc::now(),
        };
        let row = format_row(&product);
        assert!(row.starts_with("    12  Mint tea"));
        assert!(row.contains("$4.50"));
        assert!(row.ends_with("stock 20"));
    }

    #[test]
    fn test_edit_parses_price() {
        let changes = ProductEdit {
            price: Some("5.5".to_owned()),
            stock: Some(2),
            ..ProductEdit::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.price, Some("5.50".parse().unwrap()));
        assert_eq!(changes.stock, Some(2));
        assert!(changes.name.is_none());
    }

    #[test]
    fn test_edit_rejects_bad_price_before_connecting() {
        let result = ProductEdit {
            price: Some("-3".to_owned()),
            ..ProductEdit::default()
        }
        .into_changes();
        assert!(matches!(result, Err(CommandError::InvalidPrice(_))));
    }
}
