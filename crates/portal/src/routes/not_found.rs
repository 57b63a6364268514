//! 404 page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::filters;
use crate::middleware::OptionalSession;
use crate::models::SessionContext;
use crate::navigation::Navigation;

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Navigation,
    pub path: String,
}

impl NotFoundTemplate {
    /// Build the page for `path`, with the header for the current visitor.
    #[must_use]
    pub fn new(session: Option<&SessionContext>, path: &str) -> Self {
        Self {
            nav: Navigation::for_session(session, path),
            path: path.to_string(),
        }
    }

    /// Render with a 404 status.
    #[must_use]
    pub fn into_response_with_status(self) -> Response {
        (StatusCode::NOT_FOUND, self).into_response()
    }
}

/// Fallback for every unmatched route.
pub async fn fallback(OptionalSession(session): OptionalSession, uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    NotFoundTemplate::new(session.as_ref(), uri.path()).into_response_with_status()
}
