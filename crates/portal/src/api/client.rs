//! HTTP client for the backend REST API.

use reqwest::{Method, RequestBuilder, StatusCode, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use super::ApiError;
use super::types::{
    AdminStats, ChangePasswordRequest, CustomerStats, EmailRequest, Envelope, Login, LoginRequest,
    ResetPasswordRequest, TokenRequest, UpdateProfileRequest, UserProfile,
};
use crate::config::ApiConfig;
use crate::models::SessionContext;

/// Backend REST API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("courier-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` for bad credentials, or if the backend sends no token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Login, ApiError> {
        let req = self
            .request(Method::POST, "/api/auth/login", None)
            .json(&LoginRequest { email, password });
        let envelope = self.execute(req).await?;

        let token = envelope
            .token()
            .ok_or_else(|| ApiError::Rejected("Login response did not include a token".into()))?;
        let user = envelope.user_payload()?;

        Ok(Login {
            token: SecretString::from(token),
            user,
        })
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        self.post_message("/api/auth/forgot-password", None, &EmailRequest { email })
            .await
    }

    /// Set a new password using the token from a reset email.
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<Option<String>, ApiError> {
        self.post_message(
            "/api/auth/reset-password",
            None,
            &ResetPasswordRequest { token, password },
        )
        .await
    }

    /// Confirm an email address using the token from a verification email.
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<Option<String>, ApiError> {
        self.post_message("/api/auth/verify-email", None, &TokenRequest { token })
            .await
    }

    /// Send the verification email again.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn resend_verification(
        &self,
        session: &SessionContext,
    ) -> Result<Option<String>, ApiError> {
        let req = self.request(
            Method::POST,
            "/api/auth/resend-verification",
            Some(session.access_token()),
        );
        Ok(self.execute(req).await?.message)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is no longer valid.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn profile(&self, session: &SessionContext) -> Result<UserProfile, ApiError> {
        let req = self.request(Method::GET, "/api/users/me", Some(session.access_token()));
        Ok(self.execute(req).await?.user_payload()?)
    }

    /// Update the signed-in user's profile.
    ///
    /// Returns the profile as stored by the backend plus its message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the update is rejected.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn update_profile(
        &self,
        session: &SessionContext,
        update: &UpdateProfileRequest,
    ) -> Result<(UserProfile, Option<String>), ApiError> {
        let req = self
            .request(Method::PUT, "/api/users/me", Some(session.access_token()))
            .json(update);
        let envelope = self.execute(req).await?;
        let profile = envelope.user_payload()?;
        Ok((profile, envelope.message))
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns error if the current password is wrong or the request fails.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn change_password(
        &self,
        session: &SessionContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .request(
                Method::PUT,
                "/api/users/me/password",
                Some(session.access_token()),
            )
            .json(&ChangePasswordRequest {
                current_password,
                new_password,
            });
        Ok(self.execute(req).await?.message)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Package counts for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn customer_stats(&self, session: &SessionContext) -> Result<CustomerStats, ApiError> {
        let req = self.request(
            Method::GET,
            "/api/users/me/stats",
            Some(session.access_token()),
        );
        Ok(self.execute(req).await?.stats_payload()?)
    }

    /// Company-wide counts for staff roles.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the role may not see them.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn admin_stats(&self, session: &SessionContext) -> Result<AdminStats, ApiError> {
        let req = self.request(Method::GET, "/api/admin/stats", Some(session.access_token()));
        Ok(self.execute(req).await?.stats_payload()?)
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the backend does not answer with a success status.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .request(Method::GET, "/api/health", None)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Api {
                status: status.as_u16(),
                message: "backend health check failed".to_string(),
            })
        }
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Build a request, attaching the bearer token when given.
    fn request(&self, method: Method, path: &str, token: Option<&SecretString>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.request(method, url);

        match token {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }

    /// POST a JSON body and return the envelope's message.
    async fn post_message<B>(
        &self,
        path: &str,
        token: Option<&SecretString>,
        body: &B,
    ) -> Result<Option<String>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::POST, path, token).json(body);
        Ok(self.execute(req).await?.message)
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// A 401 only means an expired session when a bearer token was sent; on
    /// the anonymous auth endpoints it is an ordinary rejection.
    async fn execute(&self, req: RequestBuilder) -> Result<Envelope, ApiError> {
        let (client, request) = req.build_split();
        let request = request?;
        let authenticated = request.headers().contains_key(AUTHORIZATION);

        let response = client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && authenticated {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;
        let envelope = if body.trim().is_empty() {
            Envelope::default()
        } else {
            match serde_json::from_str::<Envelope>(&body) {
                Ok(envelope) => envelope,
                Err(e) if status.is_success() => return Err(ApiError::Parse(e)),
                // Error pages from proxies are HTML; keep the status, drop the body.
                Err(_) => Envelope::default(),
            }
        };

        if !status.is_success() {
            let message = envelope.message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            tracing::warn!(status = status.as_u16(), message = %message, "Backend returned an error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if envelope.success == Some(false) {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "The request was not accepted.".to_string()),
            ));
        }

        Ok(envelope)
    }
}
