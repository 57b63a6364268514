//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Redirect to landing page or login
//! GET  /health                            - Liveness check
//! GET  /health/ready                      - Readiness check (pings backend)
//!
//! # Auth (rate limited)
//! GET  /auth/login                        - Login page
//! POST /auth/login                        - Login action
//! POST /auth/logout                       - Logout action
//! GET  /auth/forgot-password              - Forgot password page
//! POST /auth/forgot-password              - Request reset email
//! GET  /auth/reset-password?token=        - Reset password page
//! POST /auth/reset-password               - Set new password
//! GET  /auth/verify-email?token=          - Confirm email address
//!
//! # Customer (requires session)
//! GET  /profile                           - Profile with package counts
//! GET  /settings                          - Settings page
//! POST /settings                          - Save name, phone, branch
//! GET  /settings/address-preview?branch=  - Mailbox address fragment
//! POST /settings/password                 - Change password
//! POST /settings/resend-verification      - Resend verification email
//!
//! # Staff roles (requires session)
//! GET  /admin/profile                     - Dashboard with company counts
//! GET  /admin/settings                    - Settings page
//! POST /admin/settings                    - Save name and phone
//! POST /admin/settings/password           - Change password
//! ```

pub mod auth;
pub mod health;
pub mod home;
pub mod not_found;
pub mod profile;
pub mod settings;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{auth_rate_limiter, clear_session_context};
use crate::state::AppState;

/// Where a backend 401 sends the user.
pub const SESSION_EXPIRED_PATH: &str = "/auth/login?error=expired";

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/verify-email", get(auth::verify_email))
}

/// Create the customer page routes.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::customer))
        .route("/settings", get(settings::show).post(settings::update))
        .route("/settings/address-preview", get(settings::address_preview))
        .route("/settings/password", post(settings::change_password))
        .route(
            "/settings/resend-verification",
            post(settings::resend_verification),
        )
}

/// Create the staff-role router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::admin))
        .route(
            "/settings",
            get(settings::admin_show).post(settings::admin_update),
        )
        .route("/settings/password", post(settings::admin_change_password))
}

/// Create all page routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .merge(customer_routes())
        .nest("/admin", admin_routes())
        .fallback(not_found::fallback)
}

/// Drop the session after the backend rejected its token.
pub(crate) async fn session_expired(session: &Session) -> Response {
    if let Err(e) = clear_session_context(session).await {
        tracing::error!(error = %e, "Failed to clear expired session");
    }
    crate::error::clear_sentry_user();
    Redirect::to(SESSION_EXPIRED_PATH).into_response()
}
