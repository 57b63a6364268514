//! Application state shared across handlers.

use std::sync::Arc;

use courier_core::{AddressGenerator, MailboxError};

use crate::api::{ApiClient, ApiError};
use crate::config::PortalConfig;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("mailbox settings: {0}")]
    Mailbox(#[from] MailboxError),
    #[error("API client: {0}")]
    Api(#[from] ApiError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It holds only immutable
/// resources; per-user state travels in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    api: ApiClient,
    mailbox: AddressGenerator,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox settings are invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api)?;
        let mailbox = AddressGenerator::new(&config.mailbox.street_prefix, &config.mailbox.tag)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                mailbox,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the mailbox address generator.
    #[must_use]
    pub fn mailbox(&self) -> &AddressGenerator {
        &self.inner.mailbox
    }
}
