//! Courier Core - Shared domain types.
//!
//! This crate provides the types used by the customer portal and its tests:
//! - `UserId` - the numeric identity the backend assigns to every account
//! - `Role` - account role, driving which navigation menu a user sees
//! - `BranchCode` - the shipping branches a customer can collect from
//! - `AddressGenerator` - derives a customer's virtual mailbox address
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and enums for identities, roles, and branches
//! - [`mailbox`] - Mailbox address generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod mailbox;
pub mod types;

pub use mailbox::{AddressGenerator, MailboxError};
pub use types::*;
