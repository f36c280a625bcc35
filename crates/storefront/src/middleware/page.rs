//! Per-page layout context.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::session::take_flashes;
use crate::models::{CurrentUser, Flash, session_keys};

/// What the shared layout needs on every HTML page: who is logged in and
/// which flash messages are pending. Extracting it consumes the flashes.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Email of the logged-in user, for the header.
    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.email.as_str())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let flashes = take_flashes(session).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read flash messages: {e}");
            Vec::new()
        });

        Ok(Self { user, flashes })
    }
}
