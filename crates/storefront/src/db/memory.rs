//! In-process [`Store`] used by tests and local demos.
//!
//! Every operation takes the same mutex for its whole duration, which gives
//! the same guarantees the `PostgreSQL` store gets from unique indexes and
//! the checkout transaction: one cart per owner, one line per
//! `(cart, product)`, and all-or-nothing order placement.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use souq_core::{
    CartId, CartItemId, Email, Identity, OrderId, OrderItemId, ProductId, Quantity, UserId,
};

use super::{
    CartRepository, OrderRepository, ProductRepository, RepositoryError, Store, UserRepository,
};
use crate::models::{
    Cart, CartItem, CartLine, NewProduct, Order, OrderItem, OrderLine, Product, ShippingDetails,
    User,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    users: BTreeMap<UserId, (User, String)>,
}

impl Tables {
    /// One sequence for every table, like a shared `SERIAL`.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn cart_of(&self, owner: &Identity) -> Option<&Cart> {
        self.carts.values().find(|cart| cart.owner == *owner)
    }

    fn product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.products.get(&id).cloned().ok_or_else(|| {
            RepositoryError::DataCorruption(format!("line references missing product {id}"))
        })
    }
}

/// [`Store`] kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic mid-operation cannot leave partial writes: every mutation
        // below validates first and writes last.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables().products.values().rev().cloned().collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables();
        let id = ProductId::new(tables.next_id());
        let product = Product {
            id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            image: product.image.clone(),
            created_at: Utc::now(),
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables();
        let Some(existing) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        existing.name.clone_from(&product.name);
        existing.description.clone_from(&product.description);
        existing.price = product.price;
        existing.stock = product.stock;
        existing.image.clone_from(&product.image);
        Ok(Some(existing.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        if !tables.products.contains_key(&id) {
            return Ok(false);
        }
        if tables.order_items.values().any(|item| item.product_id == id) {
            return Err(RepositoryError::Conflict(format!(
                "product {id} appears in orders"
            )));
        }

        tables.cart_items.retain(|_, item| item.product_id != id);
        tables.products.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables().cart_of(owner).cloned())
    }

    async fn find_or_create_cart(&self, owner: &Identity) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables();
        if let Some(cart) = tables.cart_of(owner) {
            return Ok(cart.clone());
        }

        let cart = Cart {
            id: CartId::new(tables.next_id()),
            owner: *owner,
            created_at: Utc::now(),
        };
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.tables();
        tables
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .map(|item| {
                Ok(CartLine {
                    product: tables.product(item.product_id)?,
                    item: item.clone(),
                })
            })
            .collect()
    }

    async fn add_to_cart(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        delta: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables();
        if !tables.carts.contains_key(&cart_id) || !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let existing = tables
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id);

        if let Some(item) = existing {
            item.quantity = item
                .quantity
                .checked_add(delta.get())
                .ok_or_else(|| RepositoryError::Conflict("value out of range".to_owned()))?;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: CartItemId::new(tables.next_id()),
            cart_id,
            product_id,
            quantity: delta.get(),
        };
        tables.cart_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn remove_from_cart(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        let owned = tables
            .cart_items
            .get(&item_id)
            .is_some_and(|item| item.cart_id == cart_id);
        if owned {
            tables.cart_items.remove(&item_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(
        &self,
        owner: &Identity,
        shipping: &ShippingDetails,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables();
        let Some(cart_id) = tables.cart_of(owner).map(|cart| cart.id) else {
            return Ok(None);
        };

        let items: Vec<CartItem> = tables
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect();
        if items.is_empty() {
            return Ok(None);
        }

        let order = Order {
            id: OrderId::new(tables.next_id()),
            owner: *owner,
            customer_name: shipping.customer_name().to_owned(),
            phone: shipping.phone().to_owned(),
            address: shipping.address().to_owned(),
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());

        for item in &items {
            let order_item = OrderItem {
                id: OrderItemId::new(tables.next_id()),
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
            };
            tables.order_items.insert(order_item.id, order_item);
            tables.cart_items.remove(&item.id);
        }
        tables.carts.remove(&cart_id);

        Ok(Some(order))
    }

    async fn list_orders(&self, owner: &Identity) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables();
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| order.owner == *owner)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_order(
        &self,
        owner: &Identity,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .tables()
            .orders
            .get(&id)
            .filter(|order| order.owner == *owner)
            .cloned())
    }

    async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError> {
        let tables = self.tables();
        let mut lines = tables
            .order_items
            .values()
            .filter(|item| order_ids.contains(&item.order_id))
            .map(|item| {
                Ok(OrderLine {
                    product: tables.product(item.product_id)?,
                    item: item.clone(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        lines.sort_by_key(|line| (line.item.order_id, line.item.id));
        Ok(lines)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        if tables.users.values().any(|(user, _)| user.email == *email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|(user, _)| user.email == *email)
            .cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().users.get(&id).map(|(user, _)| user.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
