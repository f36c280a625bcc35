//! Line-item quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Rejected quantity value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least {min}")]
    TooSmall { min: i32 },
    #[error("quantity must be at most {max}")]
    TooLarge { max: i32 },
}

/// A positive quantity of one product, as added to a cart in one step.
///
/// Bounded to `1..=9999` so a single request cannot push a line total
/// past what `NUMERIC(10,2)` prices comfortably hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 9999;

    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is outside `1..=9999`.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < Self::MIN {
            Err(QuantityError::TooSmall { min: Self::MIN })
        } else if value > Self::MAX {
            Err(QuantityError::TooLarge { max: Self::MAX })
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
