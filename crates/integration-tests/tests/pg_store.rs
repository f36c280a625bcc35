//! `PostgreSQL` store tests.
//!
//! Every test returns early when `DATABASE_URL` is unset.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use souq_core::{CartId, GuestToken, Identity, ProductId, Quantity};
use souq_storefront::db::{
    CartRepository, OrderRepository, PgStore, ProductRepository, RepositoryError,
};
use souq_storefront::models::{NewProduct, Product, ShippingDetails};

use souq_integration_tests::{pg_store, pg_store_with_lock_timeout};

async fn product(store: &PgStore, name: &str, price: &str) -> Product {
    store
        .create_product(&NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price: price.parse().unwrap(),
            stock: 10,
            image: None,
        })
        .await
        .unwrap()
}

fn guest() -> Identity {
    Identity::Guest(GuestToken::generate())
}

fn qty(n: i32) -> Quantity {
    Quantity::new(n).unwrap()
}

fn shipping() -> ShippingDetails {
    ShippingDetails::parse("Nour", "+20 100 000 0000", "3 Tahrir Sq, Cairo").unwrap()
}

async fn cart_item_count(store: &PgStore, cart_id: CartId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM storefront.cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_concurrent_find_or_create_yields_one_cart() {
    let Some(store) = pg_store().await else {
        return;
    };
    let owner = guest();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.find_or_create_cart(&owner).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let Identity::Guest(token) = owner else {
        unreachable!()
    };
    let carts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM storefront.carts WHERE guest_token = $1")
            .bind(token.as_uuid())
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(carts, 1);
}

#[tokio::test]
async fn test_add_to_cart_upserts_one_line_per_product() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "2.00").await;
    let cart = store.find_or_create_cart(&guest()).await.unwrap();

    let first = store.add_to_cart(cart.id, tea.id, qty(1)).await.unwrap();
    let second = store.add_to_cart(cart.id, tea.id, qty(2)).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 3);

    let lines = store.cart_lines(cart.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_total(), "6.00".parse().unwrap());

    let unknown_product = store
        .add_to_cart(cart.id, ProductId::new(i32::MAX), qty(1))
        .await;
    assert!(matches!(unknown_product, Err(RepositoryError::NotFound)));

    let unknown_cart = store
        .add_to_cart(CartId::new(i32::MAX), tea.id, qty(1))
        .await;
    assert!(matches!(unknown_cart, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_remove_from_cart_is_scoped_to_cart() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "2.00").await;
    let mine = store.find_or_create_cart(&guest()).await.unwrap();
    let theirs = store.find_or_create_cart(&guest()).await.unwrap();
    let their_item = store.add_to_cart(theirs.id, tea.id, qty(1)).await.unwrap();

    assert!(!store.remove_from_cart(mine.id, their_item.id).await.unwrap());
    assert_eq!(cart_item_count(&store, theirs.id).await, 1);

    assert!(store.remove_from_cart(theirs.id, their_item.id).await.unwrap());
    assert_eq!(cart_item_count(&store, theirs.id).await, 0);
}

#[tokio::test]
async fn test_place_order_copies_lines_and_deletes_cart() {
    let Some(store) = pg_store().await else {
        return;
    };
    let a = product(&store, "A", "10.00").await;
    let b = product(&store, "B", "5.00").await;
    let owner = guest();
    let cart = store.find_or_create_cart(&owner).await.unwrap();
    store.add_to_cart(cart.id, a.id, qty(2)).await.unwrap();
    store.add_to_cart(cart.id, b.id, qty(1)).await.unwrap();

    let order = store.place_order(&owner, &shipping()).await.unwrap().unwrap();
    assert_eq!(order.owner, owner);
    assert_eq!(order.customer_name, "Nour");

    let lines = store.order_lines(&[order.id]).await.unwrap();
    let copied: Vec<_> = lines
        .iter()
        .map(|line| (line.product.id, line.item.quantity))
        .collect();
    assert_eq!(copied, vec![(a.id, 2), (b.id, 1)]);

    assert!(store.find_cart(&owner).await.unwrap().is_none());
    assert_eq!(cart_item_count(&store, cart.id).await, 0);
}

#[tokio::test]
async fn test_place_order_with_empty_or_missing_cart_changes_nothing() {
    let Some(store) = pg_store().await else {
        return;
    };
    let owner = guest();
    assert!(store.place_order(&owner, &shipping()).await.unwrap().is_none());

    let cart = store.find_or_create_cart(&owner).await.unwrap();
    assert!(store.place_order(&owner, &shipping()).await.unwrap().is_none());

    assert_eq!(store.find_cart(&owner).await.unwrap().map(|c| c.id), Some(cart.id));
    assert!(store.list_orders(&owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_orders_newest_first_and_scoped() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "1.00").await;
    let owner = guest();

    let mut placed = Vec::new();
    for _ in 0..3 {
        let cart = store.find_or_create_cart(&owner).await.unwrap();
        store.add_to_cart(cart.id, tea.id, qty(1)).await.unwrap();
        placed.push(store.place_order(&owner, &shipping()).await.unwrap().unwrap().id);
    }
    placed.reverse();

    let listed: Vec<_> = store
        .list_orders(&owner)
        .await
        .unwrap()
        .into_iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(listed, placed);

    let stranger = guest();
    assert!(store.list_orders(&stranger).await.unwrap().is_empty());
    assert!(store.get_order(&stranger, placed[0]).await.unwrap().is_none());
    assert!(store.get_order(&owner, placed[0]).await.unwrap().is_some());
}

#[tokio::test]
async fn test_line_writes_wait_for_checkout_lock_then_fail() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "1.00").await;
    let owner = guest();
    let cart = store.find_or_create_cart(&owner).await.unwrap();
    let item = store.add_to_cart(cart.id, tea.id, qty(1)).await.unwrap();

    // Hold the cart the way checkout does, between its copy and delete.
    let mut checkout = store.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM storefront.carts WHERE id = $1 FOR UPDATE")
        .bind(cart.id)
        .execute(&mut *checkout)
        .await
        .unwrap();

    let (cart_id, product_id, item_id) = (cart.id, tea.id, item.id);
    let increment = {
        let store = store.clone();
        tokio::spawn(async move { store.add_to_cart(cart_id, product_id, qty(5)).await })
    };
    let removal = {
        let store = store.clone();
        tokio::spawn(async move { store.remove_from_cart(cart_id, item_id).await })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!increment.is_finished(), "increment must wait for the cart lock");
    assert!(!removal.is_finished(), "removal must wait for the cart lock");

    sqlx::query("DELETE FROM storefront.cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *checkout)
        .await
        .unwrap();
    sqlx::query("DELETE FROM storefront.carts WHERE id = $1")
        .bind(cart.id)
        .execute(&mut *checkout)
        .await
        .unwrap();
    checkout.commit().await.unwrap();

    assert!(matches!(
        increment.await.unwrap(),
        Err(RepositoryError::NotFound)
    ));
    assert!(!removal.await.unwrap().unwrap());
    assert_eq!(cart_item_count(&store, cart.id).await, 0);
}

#[tokio::test]
async fn test_failed_checkout_rolls_back() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "4.00").await;
    let owner = guest();
    let cart = store.find_or_create_cart(&owner).await.unwrap();
    store.add_to_cart(cart.id, tea.id, qty(2)).await.unwrap();

    // Copying the line needs a key-share lock on the product; holding the
    // product row exclusively makes that step time out after the order
    // row was already inserted.
    let mut blocker = store.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM storefront.products WHERE id = $1 FOR UPDATE")
        .bind(tea.id)
        .execute(&mut *blocker)
        .await
        .unwrap();

    let impatient = pg_store_with_lock_timeout("200ms").await;
    let result = impatient.place_order(&owner, &shipping()).await;
    assert!(matches!(result, Err(RepositoryError::Database(_))));
    blocker.rollback().await.unwrap();

    assert!(store.list_orders(&owner).await.unwrap().is_empty());
    assert_eq!(store.find_cart(&owner).await.unwrap().map(|c| c.id), Some(cart.id));
    let lines = store.cart_lines(cart.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item.quantity, 2);
}

#[tokio::test]
async fn test_update_product() {
    let Some(store) = pg_store().await else {
        return;
    };
    let tea = product(&store, "Tea", "1.00").await;

    let updated = store
        .update_product(
            tea.id,
            &NewProduct {
                name: "Green tea".to_owned(),
                description: "Sencha".to_owned(),
                price: "1.50".parse().unwrap(),
                stock: 4,
                image: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, tea.id);
    assert_eq!(updated.name, "Green tea");
    assert_eq!(updated.created_at, tea.created_at);
    assert_eq!(store.get_product(tea.id).await.unwrap(), Some(updated));

    let missing = store
        .update_product(
            ProductId::new(i32::MAX),
            &NewProduct {
                name: "x".to_owned(),
                description: String::new(),
                price: "1".parse().unwrap(),
                stock: 0,
                image: None,
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_delete_product_cascades_carts_and_is_restricted_by_orders() {
    let Some(store) = pg_store().await else {
        return;
    };
    let carted = product(&store, "In a cart", "1.00").await;
    let ordered = product(&store, "Ordered", "1.00").await;

    let shopper = guest();
    let cart = store.find_or_create_cart(&shopper).await.unwrap();
    store.add_to_cart(cart.id, carted.id, qty(1)).await.unwrap();

    let buyer = guest();
    let buyer_cart = store.find_or_create_cart(&buyer).await.unwrap();
    store.add_to_cart(buyer_cart.id, ordered.id, qty(1)).await.unwrap();
    store.place_order(&buyer, &shipping()).await.unwrap().unwrap();

    // Put the ordered product into an open cart too; the failed delete must
    // leave that line in place.
    store.add_to_cart(cart.id, ordered.id, qty(1)).await.unwrap();

    assert!(store.delete_product(carted.id).await.unwrap());
    assert!(store.get_product(carted.id).await.unwrap().is_none());
    assert_eq!(cart_item_count(&store, cart.id).await, 1);

    let restricted = store.delete_product(ordered.id).await;
    assert!(matches!(restricted, Err(RepositoryError::Conflict(_))));
    assert!(store.get_product(ordered.id).await.unwrap().is_some());
    assert_eq!(cart_item_count(&store, cart.id).await, 1);

    assert!(!store.delete_product(carted.id).await.unwrap());
}
