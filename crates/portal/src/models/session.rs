//! Session-related types.
//!
//! Types stored in the session for authentication state.

use courier_core::{Role, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The authenticated user's context for one request.
///
/// Stored in the server-side session at login and handed explicitly to every
/// backend call that needs the bearer token.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Backend account ID.
    pub user_id: UserId,
    /// Login email.
    pub email: String,
    /// Name shown in the header.
    pub display_name: String,
    /// Account role, selects the navigation menu.
    pub role: Role,
    #[serde(with = "secret_token")]
    access_token: SecretString,
}

impl SessionContext {
    /// Create a session context from a successful login.
    #[must_use]
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        access_token: SecretString,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
            role,
            access_token,
        }
    }

    /// The bearer token for backend requests.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// Where this user lands after login.
    #[must_use]
    pub const fn landing_path(&self) -> &'static str {
        if self.role.is_staff() {
            "/admin/profile"
        } else {
            "/profile"
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// The session store is server-side, so the token is written as a plain string.
mod secret_token {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(token.expose_secret())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current session context.
    pub const SESSION_CONTEXT: &str = "session_context";
}
