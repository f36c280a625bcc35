//! Orders, their items, and the shipping details captured at checkout.

use chrono::{DateTime, Utc};
use thiserror::Error;

use souq_core::{Identity, OrderId, OrderItemId, Price, ProductId};

use super::Product;

/// Maximum length of the customer name.
pub const MAX_CUSTOMER_NAME_LENGTH: usize = 150;

/// Maximum length of the phone number.
pub const MAX_PHONE_LENGTH: usize = 50;

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub owner: Identity,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of one cart item taken at checkout.
///
/// Only the quantity is captured; the price is always read from the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// An order item joined with its product.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Product,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.item.quantity)
    }
}

/// Rejected shipping form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Validated customer name, phone and address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    customer_name: String,
    phone: String,
    address: String,
}

impl ShippingDetails {
    /// Validate raw form input. Values are trimmed; all three are required.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError` for the first blank or over-long field.
    pub fn parse(customer_name: &str, phone: &str, address: &str) -> Result<Self, ShippingError> {
        Ok(Self {
            customer_name: required("customer name", customer_name, Some(MAX_CUSTOMER_NAME_LENGTH))?,
            phone: required("phone", phone, Some(MAX_PHONE_LENGTH))?,
            address: required("address", address, None)?,
        })
    }

    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

fn required(field: &'static str, value: &str, max: Option<usize>) -> Result<String, ShippingError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ShippingError::Missing(field));
    }
    if let Some(max) = max
        && value.chars().count() > max
    {
        return Err(ShippingError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_fields() {
        let details = ShippingDetails::parse(" Ada ", " 555-0100", "1 Analytical Way \n").unwrap();
        assert_eq!(details.customer_name(), "Ada");
        assert_eq!(details.phone(), "555-0100");
        assert_eq!(details.address(), "1 Analytical Way");
    }

    #[test]
    fn test_parse_requires_every_field() {
        assert_eq!(
            ShippingDetails::parse("", "555", "street"),
            Err(ShippingError::Missing("customer name"))
        );
        assert_eq!(
            ShippingDetails::parse("Ada", "  ", "street"),
            Err(ShippingError::Missing("phone"))
        );
        assert_eq!(
            ShippingDetails::parse("Ada", "555", ""),
            Err(ShippingError::Missing("address"))
        );
    }

    #[test]
    fn test_parse_enforces_lengths() {
        let long_name = "n".repeat(MAX_CUSTOMER_NAME_LENGTH + 1);
        assert_eq!(
            ShippingDetails::parse(&long_name, "555", "street"),
            Err(ShippingError::TooLong {
                field: "customer name",
                max: MAX_CUSTOMER_NAME_LENGTH
            })
        );

        let long_phone = "5".repeat(MAX_PHONE_LENGTH + 1);
        assert!(ShippingDetails::parse("Ada", &long_phone, "street").is_err());

        let exact = "n".repeat(MAX_CUSTOMER_NAME_LENGTH);
        assert!(ShippingDetails::parse(&exact, "555", "street").is_ok());
    }
}
