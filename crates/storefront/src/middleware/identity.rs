//! Identity extractors.
//!
//! Every cart and order operation is scoped to an [`Identity`]: the logged-in
//! user when the session carries one, otherwise a guest token that is minted
//! and stored in the session the first time a handler needs it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use souq_core::{GuestToken, Identity};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor for the caller's identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentIdentity(owner): CurrentIdentity) -> impl IntoResponse {
///     format!("Hello, {owner}!")
/// }
/// ```
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        resolve_identity(session).await.map(Self)
    }
}

/// Identity for a session, minting a guest token if there is none.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn resolve_identity(session: &Session) -> Result<Identity, AppError> {
    if let Some(user) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?
    {
        return Ok(Identity::User(user.id));
    }

    if let Some(token) = session.get::<Uuid>(session_keys::GUEST_TOKEN).await? {
        return Ok(Identity::Guest(GuestToken::from_uuid(token)));
    }

    let token = GuestToken::generate();
    session
        .insert(session_keys::GUEST_TOKEN, token.as_uuid())
        .await?;
    tracing::debug!(guest = %Identity::Guest(token), "issued guest token");
    Ok(Identity::Guest(token))
}

/// Extractor that optionally gets the logged-in user.
///
/// Never rejects; a missing session reads as logged out.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the logged-in user from the session (logout).
///
/// The guest token, if any, is kept, so the visitor's guest cart comes back.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
