//! End-to-end harness for the courier portal.
//!
//! Each [`TestContext`] runs a real portal on an ephemeral port, wired to a
//! `wiremock` server standing in for the backend API, and drives it with a
//! cookie-keeping `reqwest` client that does not follow redirects.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let ctx = TestContext::start().await;
//!     let resp = ctx.get("/health").await;
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;

use courier_core::Role;
use courier_portal::config::PortalConfig;
use courier_portal::state::AppState;
use reqwest::{Client, Response, header, redirect};
use serde_json::{Value, json};
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bearer token every mocked login hands out.
pub const TOKEN: &str = "test-token-123";

/// A running portal plus its mocked backend.
pub struct TestContext {
    pub backend: MockServer,
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Start a mocked backend and a portal pointed at it.
    pub async fn start() -> Self {
        let backend = MockServer::start().await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let vars = HashMap::from([
            ("PORTAL_API_URL", backend.uri()),
            ("PORTAL_BASE_URL", base_url.clone()),
            ("PORTAL_API_TIMEOUT_SECS", "5".to_string()),
        ]);
        let config = PortalConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let app = courier_portal::app(AppState::new(config).unwrap());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            backend,
            client,
            base_url,
        }
    }

    /// Absolute portal URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a portal page.
    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// POST a urlencoded form to the portal.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Mount a successful login for a user with `role` and log in through the form.
    ///
    /// Returns the redirect target.
    pub async fn login_as(&self, role: Role, user: Value) -> String {
        let mut user = user;
        user["role"] = json!(role.code());
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "token": TOKEN,
                "user": user,
            })))
            .mount(&self.backend)
            .await;

        let resp = self
            .post_form(
                "/auth/login",
                &[("email", "user@example.com"), ("password", "correct-horse")],
            )
            .await;
        assert_eq!(resp.status(), 303, "login should redirect");
        location(&resp)
    }

    /// Mount `GET /api/users/me` returning `user` for the test token.
    pub async fn mock_profile(&self, user: Value) {
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header_matcher("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user })))
            .mount(&self.backend)
            .await;
    }

    /// Mount a stats endpoint returning `stats`.
    pub async fn mock_stats(&self, endpoint: &str, stats: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stats": stats })))
            .mount(&self.backend)
            .await;
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// A typical customer record as the backend returns it.
#[must_use]
pub fn customer(id: u64) -> Value {
    json!({
        "id": id,
        "first_name": "Keisha",
        "last_name": "Brown",
        "email": "user@example.com",
        "phone": "876-555-0100",
        "email_verified": true,
        "created_at": "2024-03-05T10:00:00Z"
    })
}
