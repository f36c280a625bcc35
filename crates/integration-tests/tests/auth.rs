//! Registration, login, logout and the identity switch they cause.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use souq_integration_tests::{TestContext, location};

const PASSWORD: &str = "correct horse battery";

async fn register(ctx: &TestContext, client: &Client, email: &str) -> reqwest::Response {
    client
        .post(ctx.url("/auth/register"))
        .form(&[
            ("email", email),
            ("password", PASSWORD),
            ("password_confirm", PASSWORD),
        ])
        .send()
        .await
        .unwrap()
}

async fn login(ctx: &TestContext, client: &Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(ctx.url("/auth/login"))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .unwrap()
}

async fn cart_items(ctx: &TestContext, client: &Client) -> usize {
    let cart: Value = client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    cart["items"].as_array().unwrap().len()
}

#[tokio::test]
async fn test_register_logs_in() {
    let ctx = TestContext::new().await;

    let resp = register(&ctx, &ctx.client, "amira@example.com").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let html = ctx.client.get(ctx.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("amira@example.com"));
    assert!(html.contains("Your account has been created"));
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_short_passwords() {
    let ctx = TestContext::new().await;
    register(&ctx, &ctx.client, "amira@example.com").await;

    let other = ctx.other_visitor();
    let resp = register(&ctx, &other, "Amira@Example.com").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(resp.text().await.unwrap().contains("already exists"));

    let resp = other
        .post(ctx.url("/auth/register"))
        .form(&[
            ("email", "omar@example.com"),
            ("password", "short"),
            ("password_confirm", "short"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new().await;
    register(&ctx, &ctx.client, "amira@example.com").await;

    let other = ctx.other_visitor();
    let resp = login(&ctx, &other, "amira@example.com", "not the password").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.text().await.unwrap().contains("Invalid email or password"));
}

#[tokio::test]
async fn test_user_orders_follow_the_account_across_sessions() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "2.00").await;
    register(&ctx, &ctx.client, "amira@example.com").await;

    ctx.client
        .post(ctx.url("/api/cart/items"))
        .json(&json!({ "productId": tea.id }))
        .send()
        .await
        .unwrap();
    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .json(&json!({ "customerName": "Amira", "phone": "555", "address": "Main St" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Same account, new browser.
    let laptop = ctx.other_visitor();
    let resp = login(&ctx, &laptop, "amira@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let orders: Value = laptop
        .get(ctx.url("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_guest_cart_is_not_merged_on_login_and_returns_on_logout() {
    let ctx = TestContext::new().await;
    let tea = ctx.product("Tea", "2.00").await;

    // Register on another browser, then shop as a guest here.
    register(&ctx, &ctx.other_visitor(), "amira@example.com").await;
    ctx.client
        .post(ctx.url("/api/cart/items"))
        .json(&json!({ "productId": tea.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(cart_items(&ctx, &ctx.client).await, 1);

    login(&ctx, &ctx.client, "amira@example.com", PASSWORD).await;
    assert_eq!(cart_items(&ctx, &ctx.client).await, 0);

    let resp = ctx.client.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(cart_items(&ctx, &ctx.client).await, 1);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new().await;

    for _ in 0..5 {
        let resp = login(&ctx, &ctx.client, "nobody@example.com", "wrong password").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let resp = login(&ctx, &ctx.client, "nobody@example.com", "wrong password").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // Pages stay reachable.
    let resp = ctx.client.get(ctx.url("/auth/login")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
