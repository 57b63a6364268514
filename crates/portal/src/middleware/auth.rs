//! Session extractors.
//!
//! A handler that needs to know who is calling takes [`RequireSession`] or
//! [`OptionalSession`] and hands the resulting [`SessionContext`] to every API
//! call and template that needs it. The bearer token never leaves the
//! server-side session store except in the `Authorization` header the API
//! client builds from that context.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{SessionContext, session_keys};

/// Fragment routes fetched by the settings page script end with this suffix.
const FRAGMENT_SUFFIX: &str = "-preview";

/// The caller's [`SessionContext`]; rejects visitors who are not logged in.
pub struct RequireSession(pub SessionContext);

/// Why [`RequireSession`] turned a request away.
#[derive(Debug)]
pub enum AuthRejection {
    /// Page request without a login: send the browser to the login form.
    RedirectToLogin,
    /// Fragment request without a login, or no session layer at all.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        match load(session).await {
            Some(context) => Ok(Self(context)),
            // A script would follow a redirect and splice the login page in.
            None if parts.uri.path().ends_with(FRAGMENT_SUFFIX) => Err(AuthRejection::Unauthorized),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}

/// The caller's [`SessionContext`] if they are logged in.
///
/// Used by pages that render for guests too, such as the login form and the
/// 404 page, so the header can show the right menu.
pub struct OptionalSession(pub Option<SessionContext>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = match parts.extensions.get::<Session>() {
            Some(session) => load(session).await,
            None => None,
        };
        Ok(Self(context))
    }
}

/// Read the stored context. An unreadable entry counts as logged out.
async fn load(session: &Session) -> Option<SessionContext> {
    match session.get(session_keys::SESSION_CONTEXT).await {
        Ok(context) => context,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable session context");
            None
        }
    }
}

/// Start an authenticated session for `context`.
///
/// The session ID is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session store rejects the change.
pub async fn set_session_context(
    session: &Session,
    context: &SessionContext,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::SESSION_CONTEXT, context).await
}

/// End the session on logout or when the backend rejects the token.
///
/// # Errors
///
/// Returns an error if the session store rejects the change.
pub async fn clear_session_context(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<SessionContext>(session_keys::SESSION_CONTEXT)
        .await?;
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use courier_core::{Role, UserId};
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts(uri: &str, session: Option<Session>) -> Parts {
        let mut request = Request::builder().uri(uri).body(()).unwrap();
        if let Some(session) = session {
            request.extensions_mut().insert(session);
        }
        request.into_parts().0
    }

    fn empty_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn context() -> SessionContext {
        SessionContext::new(
            UserId::new(15),
            "k.brown@example.com",
            "Keisha Brown",
            Role::Customer,
            SecretString::from("t"),
        )
    }

    #[tokio::test]
    async fn test_guest_page_request_redirects() {
        let mut parts = parts("/settings", Some(empty_session()));
        let rejection = RequireSession::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_guest_fragment_request_is_unauthorized() {
        let mut parts = parts("/settings/address-preview", Some(empty_session()));
        let rejection = RequireSession::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::Unauthorized));
    }

    #[tokio::test]
    async fn test_stored_context_is_extracted_then_cleared() {
        let session = empty_session();
        set_session_context(&session, &context()).await.unwrap();

        let mut req = parts("/profile", Some(session.clone()));
        let RequireSession(ctx) = RequireSession::from_request_parts(&mut req, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(ctx.user_id, UserId::new(15));

        clear_session_context(&session).await.unwrap();
        let mut req = parts("/profile", Some(session));
        let OptionalSession(ctx) = OptionalSession::from_request_parts(&mut req, &())
            .await
            .unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn test_optional_session_without_layer() {
        let mut req = parts("/auth/login", None);
        let OptionalSession(ctx) = OptionalSession::from_request_parts(&mut req, &())
            .await
            .unwrap();
        assert!(ctx.is_none());
    }
}
