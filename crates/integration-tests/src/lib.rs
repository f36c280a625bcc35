//! Integration tests for the Souq storefront.
//!
//! Each [`TestContext`] serves the full storefront router on an ephemeral
//! local port, backed by the in-memory repository and an in-memory session
//! store, so the tests need no database.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_storefront_health() {
//!     let ctx = TestContext::new().await;
//!     let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use reqwest::Client;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use souq_core::Price;
use souq_storefront::config::StorefrontConfig;
use souq_storefront::db::{MemoryStore, PgStore, create_pool};
use souq_storefront::middleware::create_session_layer;
use souq_storefront::models::Product;
use souq_storefront::services::Catalog;
use souq_storefront::state::AppState;

/// A running storefront plus a client acting as one visitor.
pub struct TestContext {
    /// Cookie-carrying client; redirects are not followed.
    pub client: Client,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    /// Start a storefront on `127.0.0.1:0`.
    pub async fn new() -> Self {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://unused"),
            host: addr.ip(),
            port: addr.port(),
            base_url: url::Url::parse(&base_url).expect("valid base url"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());
        let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), false);
        let app = souq_storefront::app(state, session_layer);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server");
        });

        Self {
            client: visitor(),
            base_url,
            store,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A second, independent visitor with its own cookie jar.
    #[must_use]
    pub fn other_visitor(&self) -> Client {
        visitor()
    }

    /// Seed a product directly through the catalog.
    pub async fn product(&self, name: &str, price: &str) -> Product {
        let price: Price = price.parse().expect("valid price");
        Catalog::new(self.store.as_ref())
            .create_product(name, &format!("{name} description"), price, 10)
            .await
            .expect("create product")
    }
}

fn visitor() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("build reqwest client")
}

/// Value of the `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// A migrated `PostgreSQL` store, or `None` when `DATABASE_URL` is unset.
///
/// Tests share the database, so each one works with its own products and
/// identities.
pub async fn pg_store() -> Option<PgStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
        }
        return None;
    };

    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("connect to DATABASE_URL");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("run storefront migrations");
    Some(PgStore::new(pool))
}

/// A store on the same database whose connections give up waiting for a
/// row lock after `lock_timeout`, used to force a failure mid-transaction.
pub async fn pg_store_with_lock_timeout(lock_timeout: &str) -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let options = url
        .parse::<PgConnectOptions>()
        .expect("valid DATABASE_URL")
        .options([("lock_timeout", lock_timeout)]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("connect to DATABASE_URL");
    PgStore::new(pool)
}
