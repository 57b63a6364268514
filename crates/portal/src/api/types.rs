//! Backend request and response types.
//!
//! Response types are deliberately forgiving: every field has a default and a
//! JSON `null` is treated like a missing field, so a partial payload still
//! renders a page.

use chrono::{DateTime, Utc};
use courier_core::types::branch::deserialize_lenient;
use courier_core::{BranchCode, Role, UserId};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// Envelope
// =============================================================================

/// The JSON wrapper every backend response uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    /// Explicit outcome; when absent the HTTP status decides.
    pub success: Option<bool>,
    /// Human-readable message for the user.
    pub message: Option<String>,
    /// Bearer token (login only).
    pub token: Option<String>,
    /// Generic payload.
    pub data: Option<Value>,
    /// User payload.
    pub user: Option<Value>,
    /// Statistics payload.
    pub stats: Option<Value>,
}

impl Envelope {
    /// Extract the user payload from `user`, `data.user`, or `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but has the wrong shape.
    pub fn user_payload<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        self.payload(self.user.as_ref(), "user")
    }

    /// Extract the statistics payload from `stats`, `data.stats`, or `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but has the wrong shape.
    pub fn stats_payload<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        self.payload(self.stats.as_ref(), "stats")
    }

    /// The bearer token from `token` or `data.token`.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| {
                self.data
                    .as_ref()
                    .and_then(|d| d.get("token"))
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .filter(|t| !t.is_empty())
    }

    fn payload<T>(&self, named: Option<&Value>, key: &str) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        let value = named
            .or_else(|| self.data.as_ref().and_then(|d| d.get(key)))
            .or(self.data.as_ref());

        match value {
            Some(v) if !v.is_null() => T::deserialize(v),
            _ => Ok(T::default()),
        }
    }
}

// =============================================================================
// Response Payloads
// =============================================================================

/// A portal account as the backend reports it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub id: UserId,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub branch: Option<BranchCode>,
    #[serde(alias = "address")]
    pub mailbox_address: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub email_verified: bool,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// First and last name joined, or the email when both are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    /// Up to two uppercase initials for the avatar badge.
    #[must_use]
    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect::<String>()
            .chars()
            .take(2)
            .collect()
    }

    /// "Month Year" the account was created, if known.
    #[must_use]
    pub fn member_since(&self) -> Option<String> {
        self.created_at.map(|at| at.format("%B %Y").to_string())
    }
}

/// Package counts for a customer's own mailbox.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CustomerStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_packages: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_transit: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub ready_for_pickup: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub delivered: u64,
}

/// Company-wide counts for the staff dashboard.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_customers: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_packages: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub packages_in_transit: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pending_verifications: u64,
}

/// Successful login: token plus the account it belongs to.
#[derive(Debug, Clone)]
pub struct Login {
    pub token: SecretString,
    pub user: UserProfile,
}

// =============================================================================
// Request Bodies
// =============================================================================

/// `POST /api/auth/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /api/auth/forgot-password` and similar email-only calls.
#[derive(Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

/// `POST /api/auth/verify-email`
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub token: &'a str,
}

/// `POST /api/auth/reset-password`
#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

/// `PUT /api/users/me/password`
#[derive(Debug, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// `PUT /api/users/me`
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailbox_address: Option<String>,
}

// =============================================================================
// Deserialize Helpers
// =============================================================================

/// Treat JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept RFC 3339 timestamps; anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|at| at.with_timezone(&Utc)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_envelope_all_fields_missing() {
        let env = envelope(json!({}));
        assert!(env.success.is_none());
        assert!(env.message.is_none());
        assert!(env.token().is_none());

        let user: UserProfile = env.user_payload().unwrap();
        assert_eq!(user.id, UserId::new(0));
        assert_eq!(user.role, Role::Customer);

        let stats: CustomerStats = env.stats_payload().unwrap();
        assert_eq!(stats, CustomerStats::default());
    }

    #[test]
    fn test_user_payload_lookup_order() {
        let env = envelope(json!({ "user": { "id": 1 }, "data": { "id": 2 } }));
        let user: UserProfile = env.user_payload().unwrap();
        assert_eq!(user.id, UserId::new(1));

        let env = envelope(json!({ "data": { "user": { "id": 3 } } }));
        let user: UserProfile = env.user_payload().unwrap();
        assert_eq!(user.id, UserId::new(3));

        let env = envelope(json!({ "data": { "id": 4, "first_name": "Ann" } }));
        let user: UserProfile = env.user_payload().unwrap();
        assert_eq!(user.id, UserId::new(4));
        assert_eq!(user.first_name, "Ann");
    }

    #[test]
    fn test_token_from_data() {
        let env = envelope(json!({ "data": { "token": "abc" } }));
        assert_eq!(env.token().as_deref(), Some("abc"));

        let env = envelope(json!({ "token": "" }));
        assert!(env.token().is_none());
    }

    #[test]
    fn test_user_profile_tolerates_nulls_and_junk() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 15,
            "first_name": null,
            "last_name": "Brown",
            "email": "k.brown@example.com",
            "role": "wizard",
            "branch": "Nowhere",
            "address": "3750 NW 28th Street, CPX Priory 15",
            "email_verified": null,
            "created_at": "last tuesday"
        }))
        .unwrap();

        assert_eq!(user.first_name, "");
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.branch, None);
        assert_eq!(
            user.mailbox_address.as_deref(),
            Some("3750 NW 28th Street, CPX Priory 15")
        );
        assert!(!user.email_verified);
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_user_profile_helpers() {
        let user: UserProfile = serde_json::from_value(json!({
            "first_name": "keisha",
            "last_name": "brown",
            "email": "k@example.com",
            "created_at": "2024-03-05T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(user.display_name(), "keisha brown");
        assert_eq!(user.initials(), "KB");
        assert_eq!(user.member_since().as_deref(), Some("March 2024"));

        let anonymous = UserProfile {
            email: "only@example.com".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(anonymous.display_name(), "only@example.com");
        assert_eq!(anonymous.initials(), "");
    }

    #[test]
    fn test_stats_tolerate_missing_counts() {
        let env = envelope(json!({ "stats": { "in_transit": 3, "delivered": null } }));
        let stats: CustomerStats = env.stats_payload().unwrap();
        assert_eq!(stats.in_transit, 3);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.total_packages, 0);
    }

    #[test]
    fn test_update_request_skips_absent_branch() {
        let body = serde_json::to_value(UpdateProfileRequest {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            phone: None,
            branch: None,
            mailbox_address: None,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({ "first_name": "Ann", "last_name": "Lee", "phone": null })
        );

        let body = serde_json::to_value(UpdateProfileRequest {
            branch: Some(BranchCode::OchoRios),
            mailbox_address: Some("X, CPX Ocho Rios 07".to_string()),
            ..UpdateProfileRequest::default()
        })
        .unwrap();
        assert_eq!(body["branch"], "Ocho Rios");
        assert_eq!(body["mailbox_address"], "X, CPX Ocho Rios 07");
    }
}
