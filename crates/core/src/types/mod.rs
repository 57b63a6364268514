//! Core types for the courier portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod branch;
pub mod id;
pub mod role;

pub use branch::{BranchCode, BranchError};
pub use id::UserId;
pub use role::{Role, RoleError};
