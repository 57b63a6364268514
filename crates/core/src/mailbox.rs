//! Virtual mailbox address generation.
//!
//! Every customer gets a mailbox at the company's overseas warehouse. The
//! address is the warehouse street line followed by a routing line made of a
//! fixed tag, the customer's collection branch, and their account number:
//!
//! ```text
//! 3750 NW 28th Street, Unit 104, Miami, FL 33142, CPX Ocho Rios 07
//! ```
//!
//! The account number is zero-padded to two digits. When the customer switches
//! branch the number already printed on their address wins over whatever ID
//! the caller has, so a mailbox keeps its number for life.

use regex::Regex;
use thiserror::Error;

use crate::types::{BranchCode, UserId};

/// Errors building an [`AddressGenerator`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailboxError {
    /// The warehouse street line is empty.
    #[error("mailbox street prefix cannot be empty")]
    EmptyStreetPrefix,
    /// The routing tag is empty or contains characters other than ASCII letters and digits.
    #[error("mailbox tag must be non-empty and alphanumeric (got {0:?})")]
    InvalidTag(String),
}

/// Builds mailbox addresses for a fixed warehouse and routing tag.
///
/// # Example
///
/// ```rust
/// use courier_core::{AddressGenerator, BranchCode, UserId};
///
/// let generator = AddressGenerator::new("1 Dock Road, Miami, FL 33142", "CPX").unwrap();
///
/// let address = generator.generate(Some(BranchCode::Priory), None, Some(UserId::new(7)));
/// assert_eq!(address, "1 Dock Road, Miami, FL 33142, CPX Priory 07");
///
/// // Switching branch keeps the number already on the address.
/// let moved = generator.generate(Some(BranchCode::Kingston), Some(&address), Some(UserId::new(99)));
/// assert_eq!(moved, "1 Dock Road, Miami, FL 33142, CPX Kingston 07");
/// ```
#[derive(Debug, Clone)]
pub struct AddressGenerator {
    street_prefix: String,
    tag: String,
    id_pattern: Regex,
}

impl AddressGenerator {
    /// Warehouse street line used when none is configured.
    pub const DEFAULT_STREET_PREFIX: &'static str =
        "3750 NW 28th Street, Unit 104, Miami, FL 33142";

    /// Routing tag used when none is configured.
    pub const DEFAULT_TAG: &'static str = "CPX";

    /// Create a generator for the given warehouse street line and routing tag.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError`] if the street line is blank or the tag is not
    /// a non-empty ASCII alphanumeric word.
    pub fn new(street_prefix: &str, tag: &str) -> Result<Self, MailboxError> {
        let street_prefix = street_prefix.trim();
        if street_prefix.is_empty() {
            return Err(MailboxError::EmptyStreetPrefix);
        }

        let tag = tag.trim();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MailboxError::InvalidTag(tag.to_string()));
        }

        // Tag as a whole word, then the branch name, then the account number.
        // A comma ends the routing line.
        let id_pattern = Regex::new(&format!(r"\b{}\b[^0-9,]*([0-9]+)", regex::escape(tag)))
            .map_err(|_| MailboxError::InvalidTag(tag.to_string()))?;

        Ok(Self {
            street_prefix: street_prefix.to_string(),
            tag: tag.to_string(),
            id_pattern,
        })
    }

    /// The warehouse street line.
    #[must_use]
    pub fn street_prefix(&self) -> &str {
        &self.street_prefix
    }

    /// The routing tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Produce the mailbox address for `branch`.
    ///
    /// - No branch: `previous` is returned unchanged (empty if absent).
    /// - The account number is recovered from `previous` when it carries the
    ///   tag; otherwise `user_id` is used.
    /// - With no account number from either source, `previous` is returned
    ///   unchanged.
    ///
    /// Never fails.
    #[must_use]
    pub fn generate(
        &self,
        branch: Option<BranchCode>,
        previous: Option<&str>,
        user_id: Option<UserId>,
    ) -> String {
        let previous = previous.unwrap_or_default();

        let Some(branch) = branch else {
            return previous.to_string();
        };

        let account = self
            .recover_account_number(previous)
            .or_else(|| user_id.map(|id| id.as_u64()));

        match account {
            Some(number) => self.format(branch, number),
            None => previous.to_string(),
        }
    }

    /// Find the account number printed after the tag in an existing address.
    ///
    /// When the tag occurs more than once the last occurrence wins.
    #[must_use]
    pub fn recover_account_number(&self, address: &str) -> Option<u64> {
        self.id_pattern
            .captures_iter(address)
            .last()
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse().ok())
    }

    /// Format a full address for a known branch and account number.
    #[must_use]
    pub fn format(&self, branch: BranchCode, account_number: u64) -> String {
        format!(
            "{}, {} {} {}",
            self.street_prefix,
            self.tag,
            branch,
            pad_account_number(account_number)
        )
    }
}

/// Render an account number with at least two digits.
fn pad_account_number(number: u64) -> String {
    format!("{number:02}")
}
