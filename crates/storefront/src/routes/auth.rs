//! Authentication route handlers.
//!
//! Password login and registration. A successful login switches the session
//! from its guest identity to the user; logout switches it back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, Flash, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put `user` in the session and send them home.
async fn start_session(session: &Session, user: User, greeting: &str) -> Result<Response> {
    let current = CurrentUser {
        id: user.id,
        email: user.email,
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    push_flash(session, Flash::success(greeting)).await?;
    Ok(Redirect::to("/").into_response())
}

/// Client errors re-render the form; anything else propagates.
fn form_error(err: AuthError) -> Result<(axum::http::StatusCode, String)> {
    let err = AppError::from(err);
    if err.status().is_server_error() {
        return Err(err);
    }
    Ok((err.status(), err.public_message()))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => start_session(&session, user, "Welcome back!").await,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let (status, message) = form_error(e)?;
            let template = LoginTemplate {
                page,
                email: form.email,
                error: Some(message),
            };
            Ok((status, template).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        email: String::new(),
        error: None,
    }
}

/// Handle registration form submission. New users are logged in directly.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = if form.password == form.password_confirm {
        AuthService::new(state.store())
            .register(&form.email, &form.password)
            .await
    } else {
        Err(AuthError::WeakPassword("passwords do not match".to_string()))
    };

    match result {
        Ok(user) => start_session(&session, user, "Your account has been created").await,
        Err(e) => {
            let (status, message) = form_error(e)?;
            let template = RegisterTemplate {
                page,
                email: form.email,
                error: Some(message),
            };
            Ok((status, template).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, Flash::success("You have been logged out")).await?;
    Ok(Redirect::to("/"))
}
