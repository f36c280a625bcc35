//! Checkout and order history through the JSON API.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use souq_integration_tests::TestContext;

fn shipping() -> Value {
    json!({
        "customerName": "Layla Haddad",
        "phone": "+20 100 000 0000",
        "address": "12 Nile St, Cairo",
    })
}

async fn add(ctx: &TestContext, client: &Client, product_id: i32, quantity: i32) {
    let resp = client
        .post(ctx.url("/api/cart/items"))
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn checkout(ctx: &TestContext, client: &Client) -> reqwest::Response {
    client
        .post(ctx.url("/api/orders"))
        .json(&shipping())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_checkout_without_items_is_empty_cart() {
    let ctx = TestContext::new().await;

    let resp = checkout(&ctx, &ctx.client).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "empty_cart");

    let orders: Value = ctx
        .client
        .get(ctx.url("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let ctx = TestContext::new().await;
    let a = ctx.product("A", "10.00").await;
    let b = ctx.product("B", "5.00").await;

    add(&ctx, &ctx.client, a.id.as_i32(), 1).await;
    add(&ctx, &ctx.client, a.id.as_i32(), 1).await;
    add(&ctx, &ctx.client, b.id.as_i32(), 1).await;

    let resp = checkout(&ctx, &ctx.client).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();

    assert_eq!(order["customerName"], "Layla Haddad");
    assert_eq!(order["phone"], "+20 100 000 0000");
    assert_eq!(order["address"], "12 Nile St, Cairo");
    assert_eq!(order["total"], "25.00");
    assert!(order["createdAt"].is_string());

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product"]["name"], "A");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["product"]["name"], "B");
    assert_eq!(items[1]["quantity"], 1);

    // The cart is gone.
    let cart: Value = ctx
        .client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["id"], Value::Null);
    assert_eq!(cart["items"], json!([]));

    // A second checkout has nothing to buy.
    assert_eq!(checkout(&ctx, &ctx.client).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orders_listed_newest_first() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "2.50").await;

    add(&ctx, &ctx.client, tea.id.as_i32(), 1).await;
    let first: Value = checkout(&ctx, &ctx.client).await.json().await.unwrap();
    add(&ctx, &ctx.client, tea.id.as_i32(), 4).await;
    let second: Value = checkout(&ctx, &ctx.client).await.json().await.unwrap();

    let orders: Value = ctx
        .client
        .get(ctx.url("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second["id"]);
    assert_eq!(orders[0]["total"], "10.00");
    assert_eq!(orders[1]["id"], first["id"]);
    assert_eq!(orders[1]["total"], "2.50");
}

#[tokio::test]
async fn test_order_detail_is_owner_scoped() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "3.00").await;

    add(&ctx, &ctx.client, tea.id.as_i32(), 1).await;
    let order: Value = checkout(&ctx, &ctx.client).await.json().await.unwrap();
    let path = format!("/api/orders/{}", order["id"]);

    let mine = ctx.client.get(ctx.url(&path)).send().await.unwrap();
    assert_eq!(mine.status(), StatusCode::OK);
    let mine: Value = mine.json().await.unwrap();
    assert_eq!(mine["total"], "3.00");

    let other = ctx.other_visitor();
    let resp = other.get(ctx.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let theirs: Value = other
        .get(ctx.url("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(theirs, json!([]));
}

#[tokio::test]
async fn test_checkout_rejects_blank_shipping_and_keeps_cart() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "3.00").await;
    add(&ctx, &ctx.client, tea.id.as_i32(), 1).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .json(&json!({ "customerName": "Layla", "phone": "   ", "address": "Cairo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["message"], "phone is required");

    let cart: Value = ctx
        .client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_lines_are_priced_from_product() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "3.00").await;
    add(&ctx, &ctx.client, tea.id.as_i32(), 2).await;

    let order: Value = checkout(&ctx, &ctx.client).await.json().await.unwrap();
    assert_eq!(order["items"][0]["totalPrice"], "6.00");
    assert_eq!(order["items"][0]["product"]["price"], "3.00");
}
