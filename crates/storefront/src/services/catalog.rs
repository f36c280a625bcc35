//! Catalog reads and operator product upkeep.

use tracing::instrument;

use souq_core::{Price, ProductId};

use super::CommerceError;
use crate::db::{RepositoryError, Store};
use crate::models::product::MAX_NAME_LENGTH;
use crate::models::{NewProduct, Product};

/// Catalog access.
pub struct Catalog<'a> {
    store: &'a dyn Store,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Storage` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(self.store.list_products().await?)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this id.
    pub async fn product(&self, id: ProductId) -> Result<Product, CommerceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("product {id}")))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Validation` for a blank or over-long name or a
    /// negative stock.
    #[instrument(skip(self, description))]
    pub async fn create_product(
        &self,
        name: &str,
        description: &str,
        price: Price,
        stock: i32,
    ) -> Result<Product, CommerceError> {
        let product = NewProduct {
            name: validate_name(name)?,
            description: description.trim().to_owned(),
            price,
            stock: validate_stock(stock)?,
            image: None,
        };
        let product = self.store.create_product(&product).await?;

        tracing::info!(product_id = %product.id, "created product");
        Ok(product)
    }

    /// Apply `changes` to a product; fields left `None` keep their value.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this id and
    /// `CommerceError::Validation` for the same inputs `create_product`
    /// rejects.
    #[instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, CommerceError> {
        let current = self.product(id).await?;

        let product = NewProduct {
            name: match changes.name {
                Some(name) => validate_name(&name)?,
                None => current.name,
            },
            description: changes
                .description
                .map_or(current.description, |d| d.trim().to_owned()),
            price: changes.price.unwrap_or(current.price),
            stock: validate_stock(changes.stock.unwrap_or(current.stock))?,
            image: current.image,
        };

        let product = self
            .store
            .update_product(id, &product)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("product {id}")))?;

        tracing::info!(product_id = %product.id, "updated product");
        Ok(product)
    }

    /// Delete a product and drop it from every open cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this id and
    /// `CommerceError::Conflict` if any order contains it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CommerceError> {
        match self.store.delete_product(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(CommerceError::NotFound(format!("product {id}"))),
            Err(RepositoryError::Conflict(reason)) => Err(CommerceError::Conflict(reason)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Field edits for [`Catalog::update_product`].
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
}

fn validate_name(name: &str) -> Result<String, CommerceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommerceError::Validation("name is required".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CommerceError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

fn validate_stock(stock: i32) -> Result<i32, CommerceError> {
    if stock < 0 {
        return Err(CommerceError::Validation(
            "stock cannot be negative".to_owned(),
        ));
    }
    Ok(stock)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souq_core::{GuestToken, Identity};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::ShippingDetails;
    use crate::services::{CartManager, Checkout};

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        let err = catalog.product(ProductId::new(42)).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(ref what) if what == "product 42"));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        let created = catalog
            .create_product("  Mint tea ", "Loose leaf", price("4.50"), 12)
            .await
            .unwrap();
        assert_eq!(created.name, "Mint tea");

        let fetched = catalog.product(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        let blank = catalog.create_product(" ", "", price("1"), 0).await;
        assert!(matches!(blank, Err(CommerceError::Validation(_))));

        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let too_long = catalog.create_product(&long, "", price("1"), 0).await;
        assert!(matches!(too_long, Err(CommerceError::Validation(_))));

        let negative = catalog.create_product("Tea", "", price("1"), -1).await;
        assert!(matches!(negative, Err(CommerceError::Validation(_))));

        assert!(catalog.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        let tea = catalog
            .create_product("Mint tea", "Loose leaf", price("4.50"), 12)
            .await
            .unwrap();

        let updated = catalog
            .update_product(
                tea.id,
                ProductChanges {
                    price: Some(price("5.00")),
                    stock: Some(3),
                    ..ProductChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Mint tea");
        assert_eq!(updated.description, "Loose leaf");
        assert_eq!(updated.price, price("5.00"));
        assert_eq!(updated.stock, 3);
        assert_eq!(catalog.product(tea.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_rejects_missing_product_and_bad_input() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        let tea = catalog.create_product("Tea", "", price("1"), 0).await.unwrap();

        let missing = catalog
            .update_product(ProductId::new(9_999), ProductChanges::default())
            .await;
        assert!(matches!(missing, Err(CommerceError::NotFound(_))));

        let blank = catalog
            .update_product(
                tea.id,
                ProductChanges {
                    name: Some("  ".to_owned()),
                    ..ProductChanges::default()
                },
            )
            .await;
        assert!(matches!(blank, Err(CommerceError::Validation(_))));

        let negative = catalog
            .update_product(
                tea.id,
                ProductChanges {
                    stock: Some(-2),
                    ..ProductChanges::default()
                },
            )
            .await;
        assert!(matches!(negative, Err(CommerceError::Validation(_))));
        assert_eq!(catalog.product(tea.id).await.unwrap().name, "Tea");
    }

    #[tokio::test]
    async fn test_delete_drops_product_from_carts() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        let carts = CartManager::new(&store);
        let tea = catalog.create_product("Tea", "", price("2"), 5).await.unwrap();
        let owner = Identity::Guest(GuestToken::generate());
        let cart = carts.resolve_cart(&owner).await.unwrap();
        carts.add_item(&cart, tea.id, 2).await.unwrap();

        catalog.delete_product(tea.id).await.unwrap();

        assert!(matches!(
            catalog.product(tea.id).await,
            Err(CommerceError::NotFound(_))
        ));
        assert!(carts.summary(&cart).await.unwrap().is_empty());
        assert!(matches!(
            catalog.delete_product(tea.id).await,
            Err(CommerceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_ordered_product_is_conflict() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        let carts = CartManager::new(&store);
        let tea = catalog.create_product("Tea", "", price("2"), 5).await.unwrap();
        let owner = Identity::Guest(GuestToken::generate());
        let cart = carts.resolve_cart(&owner).await.unwrap();
        carts.add_item(&cart, tea.id, 1).await.unwrap();
        let shipping = ShippingDetails::parse("Sam", "555", "Main St").unwrap();
        Checkout::new(&store).checkout(&owner, &shipping).await.unwrap();

        let result = catalog.delete_product(tea.id).await;
        assert!(matches!(result, Err(CommerceError::Conflict(_))));
        assert!(catalog.product(tea.id).await.is_ok());
    }
}
