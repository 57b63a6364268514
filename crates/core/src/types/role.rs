//! Account roles.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Error parsing a [`Role`] from its wire code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid role code: {0}")]
pub struct RoleError(pub String);

/// Role attached to a portal account.
///
/// Customers rent a mailbox; the other roles work for the shipping company
/// and share the back-office pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Mailbox customer.
    #[default]
    Customer,
    /// Branch staff member.
    Staff,
    /// Company administrator.
    Admin,
    /// Administrator with access to account verification.
    SuperAdmin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 4] = [Self::Customer, Self::Staff, Self::Admin, Self::SuperAdmin];

    /// The wire code the backend uses for this role.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Human-readable role name for the header badge.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Staff => "Staff",
            Self::Admin => "Administrator",
            Self::SuperAdmin => "Super Administrator",
        }
    }

    /// Whether the role belongs to company personnel rather than a customer.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            _ => Err(RoleError(s.to_string())),
        }
    }
}

// Unknown codes fall back to the least privileged role instead of failing
// the whole profile payload.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = Option::<String>::deserialize(deserializer)?;
        Ok(code.and_then(|c| c.parse().ok()).unwrap_or_default())
    }
}
