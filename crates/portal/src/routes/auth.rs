//! Authentication route handlers.
//!
//! Login, logout, password reset, and email verification. Every backend
//! failure is shown inline on the form; nothing here returns an error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalSession, clear_session_context, set_session_context};
use crate::models::SessionContext;
use crate::navigation::Navigation;
use crate::state::AppState;
use crate::validation;

const LOGIN_PATH: &str = "/auth/login";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";

/// Shown after a reset request whether or not the account exists.
const RESET_REQUESTED: &str =
    "If an account exists for that email, we have sent a link to reset your password.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Status codes carried across redirects to the login page.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Token from an emailed link.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Navigation,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub nav: Navigation,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub nav: Navigation,
    pub token: String,
    pub error: Option<String>,
}

/// Email verification outcome template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_email.html")]
pub struct VerifyEmailTemplate {
    pub nav: Navigation,
    pub verified: bool,
    pub message: String,
    /// Where the "continue" button goes.
    pub continue_href: &'static str,
}

/// Map an error code from the query string to text.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "expired" => "Your session has expired. Please log in again.",
        "session" => "We could not start your session. Please try again.",
        _ => "Something went wrong. Please log in again.",
    }
}

/// Map a success code from the query string to text.
fn login_success_message(code: &str) -> Option<&'static str> {
    match code {
        "logged_out" => Some("You have been logged out."),
        "password_reset" => Some("Your password has been reset. You can now log in."),
        _ => None,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalSession(session): OptionalSession,
    Query(query): Query<MessageQuery>,
) -> Response {
    if let Some(session) = session {
        return Redirect::to(session.landing_path()).into_response();
    }

    LoginTemplate {
        nav: Navigation::guest(LOGIN_PATH),
        email: String::new(),
        error: query.error.as_deref().map(|c| login_error_message(c).to_string()),
        success: query
            .success
            .as_deref()
            .and_then(login_success_message)
            .map(String::from),
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the session context is stored and the user is sent to the
/// landing page for their role.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let render_error = |email: &str, error: String| {
        LoginTemplate {
            nav: Navigation::guest(LOGIN_PATH),
            email: email.to_string(),
            error: Some(error),
            success: None,
        }
        .into_response()
    };

    let email = match validation::email(&form.email)
        .and_then(|email| validation::login_password(&form.password).map(|()| email))
    {
        Ok(email) => email,
        Err(e) => return render_error(form.email.trim(), e.to_string()),
    };

    let login = match state.api().login(email, &form.password).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return render_error(email, e.user_message());
        }
    };

    let user = login.user;
    let account_email = if user.email.is_empty() {
        email.to_string()
    } else {
        user.email.clone()
    };
    let context = SessionContext::new(
        user.id,
        account_email,
        user.display_name(),
        user.role,
        login.token,
    );

    if let Err(e) = set_session_context(&session, &context).await {
        tracing::error!(error = %e, "Failed to store session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&context);
    tracing::info!(user_id = %context.user_id, role = %context.role, "User logged in");

    Redirect::to(context.landing_path()).into_response()
}

/// Handle logout.
///
/// # Errors
///
/// Returns an error if the session store cannot drop the session.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_session_context(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login?success=logged_out"))
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page() -> impl IntoResponse {
    ForgotPasswordTemplate {
        nav: Navigation::guest(FORGOT_PASSWORD_PATH),
        email: String::new(),
        error: None,
        success: None,
    }
}

/// Handle forgot password form submission.
///
/// The outcome is the same whether or not the account exists.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> impl IntoResponse {
    let nav = Navigation::guest(FORGOT_PASSWORD_PATH);

    let email = match validation::email(&form.email) {
        Ok(email) => email,
        Err(e) => {
            return ForgotPasswordTemplate {
                nav,
                email: form.email.trim().to_string(),
                error: Some(e.to_string()),
                success: None,
            };
        }
    };

    if let Err(e) = state.api().forgot_password(email).await {
        tracing::warn!(error = %e, "Password reset request failed");
    }

    ForgotPasswordTemplate {
        nav,
        email: String::new(),
        error: None,
        success: Some(RESET_REQUESTED.to_string()),
    }
}

/// Display the reset password page.
///
/// Without a token there is nothing to reset, so the visitor is sent to
/// request a new link.
pub async fn reset_password_page(Query(query): Query<TokenQuery>) -> Response {
    let Some(token) = query.token() else {
        return Redirect::to(FORGOT_PASSWORD_PATH).into_response();
    };

    ResetPasswordTemplate {
        nav: Navigation::guest(RESET_PASSWORD_PATH),
        token: token.to_string(),
        error: None,
    }
    .into_response()
}

/// Handle reset password form submission.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let token = form.token.trim();
    if token.is_empty() {
        return Redirect::to(FORGOT_PASSWORD_PATH).into_response();
    }

    let render_error = |error: String| {
        ResetPasswordTemplate {
            nav: Navigation::guest(RESET_PASSWORD_PATH),
            token: token.to_string(),
            error: Some(error),
        }
        .into_response()
    };

    if let Err(e) = validation::new_password(&form.password, &form.password_confirm) {
        return render_error(e.to_string());
    }

    match state.api().reset_password(token, &form.password).await {
        Ok(_) => {
            tracing::info!("Password reset completed");
            Redirect::to("/auth/login?success=password_reset").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password reset failed");
            render_error(e.user_message())
        }
    }
}

// =============================================================================
// Email Verification
// =============================================================================

/// Confirm an email address from the link in the verification email.
#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<TokenQuery>,
) -> impl IntoResponse {
    let nav = Navigation::for_session(session.as_ref(), VERIFY_EMAIL_PATH);
    let continue_href = session
        .as_ref()
        .map_or(LOGIN_PATH, SessionContext::landing_path);

    let Some(token) = query.token() else {
        return VerifyEmailTemplate {
            nav,
            verified: false,
            message: "This verification link is incomplete. Please use the link from your email."
                .to_string(),
            continue_href,
        };
    };

    let (verified, message) = match state.api().verify_email(token).await {
        Ok(message) => {
            tracing::info!("Email verified");
            (
                true,
                message.unwrap_or_else(|| "Your email address has been verified.".to_string()),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Email verification failed");
            (false, e.user_message())
        }
    };

    VerifyEmailTemplate {
        nav,
        verified,
        message,
        continue_href,
    }
}
