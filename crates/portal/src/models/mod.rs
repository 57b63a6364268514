//! Domain models for the portal.
//!
//! Backend payloads live in [`crate::api::types`]; this module holds what the
//! portal itself keeps between requests.

pub mod session;

pub use session::{SessionContext, keys as session_keys};
