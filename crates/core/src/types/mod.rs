//! Core types for Souq.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod quantity;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{GuestToken, Identity};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
