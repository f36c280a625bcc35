//! User domain types.

use chrono::{DateTime, Utc};

use souq_core::{Email, UserId};

/// A registered customer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}
