//! Request errors that escape a handler, with Sentry integration.
//!
//! Page handlers catch backend failures themselves and show them inline, and
//! a backend 401 goes through `routes::session_expired`. `AppError` covers
//! what cannot be shown inside a form, such as a broken session store.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::SessionContext;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        // Don't expose internal error details to clients
        match self {
            Self::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Tag Sentry events with the logged-in account.
///
/// Only the ID and role are sent; the email stays out of error reports.
pub fn set_sentry_user(session: &SessionContext) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(session.user_id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("role", session.role.code());
    });
}

/// Forget the account on logout or expiry.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
        scope.remove_tag("role");
    });
}

/// Record a settings change as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    breadcrumb.data.extend(data.iter().map(|(key, value)| {
        (
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        )
    }));

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_failure() -> AppError {
        AppError::Session(tower_sessions::session::Error::Store(
            tower_sessions::session_store::Error::Backend("down".to_string()),
        ))
    }

    #[test]
    fn test_app_error_display() {
        assert!(store_failure().to_string().starts_with("Session error: "));
    }

    #[test]
    fn test_session_failure_hides_details() {
        let response = store_failure().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
