//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types.
//! Read models that join an item with its product (`CartLine`, `OrderLine`)
//! compute line totals from the live product price.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartLine};
pub use order::{Order, OrderItem, OrderLine, ShippingDetails, ShippingError};
pub use product::{NewProduct, Product};
pub use session::{CurrentUser, Flash, FlashKind, keys as session_keys};
pub use user::User;
