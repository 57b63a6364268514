//! Form validation run before anything is sent to the backend.

use courier_core::BranchCode;
use thiserror::Error;

/// Shortest password the portal accepts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A form field that failed validation. The message is shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter your password.")]
    MissingPassword,
    #[error("Password must be at least {} characters.", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("First name is required.")]
    MissingFirstName,
    #[error("Please choose a branch from the list.")]
    UnknownBranch,
}

/// Check an email address and return it trimmed.
///
/// The check is shallow: one `@` with something on both sides.
///
/// # Errors
///
/// Returns `InvalidEmail` if the address is malformed.
pub fn email(raw: &str) -> Result<&str, ValidationError> {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Check a login password (presence only).
///
/// # Errors
///
/// Returns `MissingPassword` if the field is empty.
pub const fn login_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        Err(ValidationError::MissingPassword)
    } else {
        Ok(())
    }
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns `PasswordTooShort` or `PasswordMismatch`.
pub fn new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Check a first name and return it trimmed.
///
/// # Errors
///
/// Returns `MissingFirstName` if it is blank.
pub fn first_name(raw: &str) -> Result<&str, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        Err(ValidationError::MissingFirstName)
    } else {
        Ok(name)
    }
}

/// Parse the branch selector. A blank choice means "leave unchanged".
///
/// # Errors
///
/// Returns `UnknownBranch` for any name not in [`BranchCode::ALL`].
pub fn branch(raw: &str) -> Result<Option<BranchCode>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ValidationError::UnknownBranch)
}

/// Trim an optional text field, mapping blank to `None`.
#[must_use]
pub fn optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
