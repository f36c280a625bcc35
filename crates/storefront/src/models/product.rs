//! Catalog products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{Price, ProductId};

/// Maximum length of a product name.
pub const MAX_NAME_LENGTH: usize = 200;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Informational only; orders never check or decrement it.
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub image: Option<String>,
}
