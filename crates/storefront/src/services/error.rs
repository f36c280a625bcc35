//! Errors surfaced by the commerce services.

use thiserror::Error;

use crate::db::RepositoryError;

/// Outcome of a failed catalog, cart, checkout or order operation.
///
/// Every variant reaches the caller as a distinct response; none is retried.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// A product, cart item or order does not exist or belongs to someone else.
    #[error("{0} not found")]
    NotFound(String),

    /// Checkout was attempted without items.
    #[error("cart is empty")]
    EmptyCart,

    /// The change would break a reference, e.g. deleting an ordered product.
    #[error("{0}")]
    Conflict(String),

    /// Input rejected before touching storage.
    #[error("{0}")]
    Validation(String),

    /// Storage failed; nothing was partially applied.
    #[error("storage failure: {0}")]
    Storage(#[from] RepositoryError),
}
