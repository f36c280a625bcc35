//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product reads, operator product create/edit/delete
//! - `cart` - Cart resolution, line item mutation, totals
//! - `checkout` - Cart to order conversion
//! - `orders` - Order history for an identity
//! - `auth` - Password registration and login
//!
//! Services borrow a [`Store`](crate::db::Store) and take the caller's
//! [`Identity`](souq_core::Identity) as an explicit argument.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;
pub mod orders;

pub use cart::{CartManager, CartSummary};
pub use catalog::{Catalog, ProductChanges};
pub use checkout::Checkout;
pub use error::CommerceError;
pub use orders::{OrderQuery, OrderSummary};
