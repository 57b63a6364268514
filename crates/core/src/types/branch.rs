//! Shipping branch codes.
//!
//! A branch is where a customer collects packages. Its name doubles as the
//! routing tag inside the customer's mailbox address, so the display form is
//! the exact spelling the warehouse expects.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error parsing a [`BranchCode`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown branch: {0}")]
pub struct BranchError(pub String);

/// A physical shipping branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCode {
    Priory,
    OchoRios,
    Kingston,
    MontegoBay,
    Mandeville,
    Portmore,
}

impl BranchCode {
    /// Every branch, in the order they are offered in forms.
    pub const ALL: [Self; 6] = [
        Self::Priory,
        Self::OchoRios,
        Self::Kingston,
        Self::MontegoBay,
        Self::Mandeville,
        Self::Portmore,
    ];

    /// The branch name as printed on mailbox addresses.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Priory => "Priory",
            Self::OchoRios => "Ocho Rios",
            Self::Kingston => "Kingston",
            Self::MontegoBay => "Montego Bay",
            Self::Mandeville => "Mandeville",
            Self::Portmore => "Portmore",
        }
    }
}

impl fmt::Display for BranchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BranchCode {
    type Err = BranchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|branch| branch.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BranchError(s.to_string()))
    }
}

impl Serialize for BranchCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BranchCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional branch, treating blank or unknown names as `None`.
///
/// Use with `#[serde(default, deserialize_with = "...")]` on payloads coming
/// from the backend, where a stale branch name must not fail the whole record.
///
/// # Errors
///
/// Only fails if the value is not a string or null.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<BranchCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.and_then(|n| n.parse().ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_parse_by_name() {
        assert_eq!("Priory".parse::<BranchCode>().unwrap(), BranchCode::Priory);
        assert_eq!(
            "ocho rios".parse::<BranchCode>().unwrap(),
            BranchCode::OchoRios
        );
        assert_eq!(
            "  Montego Bay ".parse::<BranchCode>().unwrap(),
            BranchCode::MontegoBay
        );
    }

    #[test]
    fn test_branch_parse_unknown() {
        let err = "Negril".parse::<BranchCode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown branch: Negril");
        assert!("".parse::<BranchCode>().is_err());
    }

    #[test]
    fn test_branch_display_matches_name() {
        for branch in BranchCode::ALL {
            assert_eq!(branch.to_string(), branch.name());
            assert_eq!(branch.name().parse::<BranchCode>().unwrap(), branch);
        }
    }

    #[test]
    fn test_branch_serde_uses_name() {
        let json = serde_json::to_string(&BranchCode::OchoRios).unwrap();
        assert_eq!(json, "\"Ocho Rios\"");

        let branch: BranchCode = serde_json::from_str("\"Kingston\"").unwrap();
        assert_eq!(branch, BranchCode::Kingston);
    }

    #[test]
    fn test_deserialize_lenient() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_lenient")]
            branch: Option<BranchCode>,
        }

        let h: Holder = serde_json::from_str(r#"{"branch":"Priory"}"#).unwrap();
        assert_eq!(h.branch, Some(BranchCode::Priory));

        let h: Holder = serde_json::from_str(r#"{"branch":"Atlantis"}"#).unwrap();
        assert_eq!(h.branch, None);

        let h: Holder = serde_json::from_str(r#"{"branch":null}"#).unwrap();
        assert_eq!(h.branch, None);

        let h: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(h.branch, None);
    }
}
