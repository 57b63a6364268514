//! Root redirect.

use axum::response::Redirect;

use crate::middleware::OptionalSession;

/// Send visitors to their landing page, or to login if they have no session.
pub async fn home(OptionalSession(session): OptionalSession) -> Redirect {
    match session {
        Some(session) => Redirect::to(session.landing_path()),
        None => Redirect::to("/auth/login"),
    }
}
