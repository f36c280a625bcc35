//! The owner of a cart or an order.
//!
//! Carts and orders belong either to an anonymous visitor (identified by a
//! random token kept in their session) or to a registered user. Core
//! operations take an [`Identity`] explicitly; nothing reads it from ambient
//! request state.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Random token identifying an anonymous visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestToken(Uuid);

impl GuestToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing token (e.g., read back from the database).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Stable key a cart or order is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity {
    /// Anonymous visitor.
    Guest(GuestToken),
    /// Logged-in user.
    User(UserId),
}

impl Identity {
    /// The user id, for authenticated identities.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The guest token, for anonymous identities.
    #[must_use]
    pub const fn guest_token(&self) -> Option<GuestToken> {
        match self {
            Self::Guest(token) => Some(*token),
            Self::User(_) => None,
        }
    }

    /// Rebuild an identity from the two nullable owner columns.
    ///
    /// Returns `None` unless exactly one of them is set.
    #[must_use]
    pub const fn from_columns(user_id: Option<UserId>, guest_token: Option<Uuid>) -> Option<Self> {
        match (user_id, guest_token) {
            (Some(id), None) => Some(Self::User(id)),
            (None, Some(token)) => Some(Self::Guest(GuestToken(token))),
            _ => None,
        }
    }

    /// Whether this is a logged-in user.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            // Only a prefix: the full token is a bearer credential for the cart.
            Self::Guest(token) => {
                let simple = token.0.simple().to_string();
                write!(f, "guest:{}", simple.get(..8).unwrap_or(&simple))
            }
        }
    }
}

impl From<UserId> for Identity {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<GuestToken> for Identity {
    fn from(token: GuestToken) -> Self {
        Self::Guest(token)
    }
}
