//! Souq Core - Shared domain types.
//!
//! This crate provides the types shared by every Souq component:
//! - `storefront` - Public shop (pages + JSON API)
//! - `cli` - Operator tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, the cart/order owner [`Identity`], prices,
//!   quantities and email addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
