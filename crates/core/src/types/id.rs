//! Numeric user identity.
//!
//! The backend assigns every account a non-negative integer ID. It never
//! changes afterwards, so the portal treats it as an opaque, copyable value.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a portal account as assigned by the backend.
///
/// # Example
///
/// ```rust
/// # use courier_core::UserId;
/// let id = UserId::new(7);
/// assert_eq!(id.as_u64(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Create a new ID from a u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_serializes_as_number() {
        let json = serde_json::to_string(&UserId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: UserId = serde_json::from_str("1205").unwrap();
        assert_eq!(id, UserId::new(1205));
    }

    #[test]
    fn test_user_id_rejects_negative() {
        assert!(serde_json::from_str::<UserId>("-3").is_err());
    }
}
