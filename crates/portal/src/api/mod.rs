//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth; the portal keeps no copy of user data
//! - Every authenticated call takes the caller's [`SessionContext`] explicitly
//!   and sends its token as `Authorization: Bearer ...`
//! - Responses arrive in a loose JSON envelope (`success`, `message`, and one of
//!   `user`/`stats`/`data`); missing fields fall back to defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_portal::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let login = client.login("ann@example.com", "hunter22").await?;
//! let profile = client.profile(&session).await?;
//! ```
//!
//! [`SessionContext`]: crate::models::SessionContext

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Bearer token missing, expired, or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// Backend answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Text to show inline next to the form or card that triggered the call.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Http(_) => {
                "Unable to reach the server. Please check your connection and try again."
                    .to_string()
            }
            Self::Api { message, .. } | Self::Rejected(message) => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Parse(_) => "Received an unexpected response from the server.".to_string(),
        }
    }

    /// Whether the session should be dropped and the user sent to login.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
