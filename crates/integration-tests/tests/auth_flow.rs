//! Login, logout, expiry, password reset, and email verification.

use courier_core::Role;
use courier_integration_tests::{TestContext, customer, location};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_customer_login_lands_on_profile() {
    let ctx = TestContext::start().await;
    assert_eq!(ctx.login_as(Role::Customer, customer(15)).await, "/profile");

    let resp = ctx.get("/").await;
    assert_eq!(location(&resp), "/profile");
}

#[tokio::test]
async fn test_staff_roles_land_on_dashboard() {
    for role in [Role::Staff, Role::Admin, Role::SuperAdmin] {
        let ctx = TestContext::start().await;
        assert_eq!(ctx.login_as(role, customer(2)).await, "/admin/profile", "{role}");
    }
}

#[tokio::test]
async fn test_logged_in_user_skips_login_page() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Admin, customer(2)).await;

    let resp = ctx.get("/auth/login").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/profile");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Customer, customer(15)).await;

    let resp = ctx.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&resp), "/auth/login?success=logged_out");

    let resp = ctx.get("/profile").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login");

    let resp = ctx.get("/auth/login?success=logged_out").await;
    assert!(resp.text().await.unwrap().contains("You have been logged out."));
}

#[tokio::test]
async fn test_backend_401_expires_session() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Customer, customer(15)).await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Token expired"
        })))
        .mount(&ctx.backend)
        .await;
    ctx.mock_stats("/api/users/me/stats", json!({})).await;

    let resp = ctx.get("/profile").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login?error=expired");

    // The session is gone, so the next page goes straight to login.
    let resp = ctx.get("/settings").await;
    assert_eq!(location(&resp), "/auth/login");
}

#[tokio::test]
async fn test_failed_login_keeps_email_and_shows_message() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid credentials"
        })))
        .mount(&ctx.backend)
        .await;

    let resp = ctx
        .post_form(
            "/auth/login",
            &[("email", "k.brown@example.com"), ("password", "nope-nope")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("k.brown@example.com"));
    assert!(body.contains("Invalid credentials"));
    assert!(!body.contains("session has expired"));
}

#[tokio::test]
async fn test_reset_password_validates_then_submits() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({ "token": "reset-abc", "password": "new-password-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Password updated"
        })))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let resp = ctx.get("/auth/reset-password?token=reset-abc").await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("reset-abc"));

    let resp = ctx
        .post_form(
            "/auth/reset-password",
            &[
                ("token", "reset-abc"),
                ("password", "short"),
                ("password_confirm", "short"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Password must be at least 8 characters.")
    );

    let resp = ctx
        .post_form(
            "/auth/reset-password",
            &[
                ("token", "reset-abc"),
                ("password", "new-password-1"),
                ("password_confirm", "new-password-2"),
            ],
        )
        .await;
    assert!(resp.text().await.unwrap().contains("Passwords do not match."));

    let resp = ctx
        .post_form(
            "/auth/reset-password",
            &[
                ("token", "reset-abc"),
                ("password", "new-password-1"),
                ("password_confirm", "new-password-1"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login?success=password_reset");
}

#[tokio::test]
async fn test_forgot_password_hides_unknown_accounts() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "No such user"
        })))
        .mount(&ctx.backend)
        .await;

    let resp = ctx
        .post_form("/auth/forgot-password", &[("email", "nobody@example.com")])
        .await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("If an account exists"));
    assert!(!body.contains("No such user"));
}

#[tokio::test]
async fn test_verify_email_outcomes() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-email"))
        .and(body_json(json!({ "token": "good" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Email verified successfully"
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-email"))
        .and(body_json(json!({ "token": "stale" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Verification link has expired"
        })))
        .mount(&ctx.backend)
        .await;

    let body = ctx
        .get("/auth/verify-email?token=good")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Email verified successfully"));

    let body = ctx
        .get("/auth/verify-email?token=stale")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Verification failed"));
    assert!(body.contains("Verification link has expired"));

    let body = ctx.get("/auth/verify-email").await.text().await.unwrap();
    assert!(body.contains("incomplete"));
}

#[tokio::test]
async fn test_login_page_served_without_proxy_headers() {
    let ctx = TestContext::start().await;
    let resp = ctx.get("/auth/login").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_pages_throttled_per_peer_address() {
    let ctx = TestContext::start().await;
    for _ in 0..10 {
        assert_eq!(ctx.get("/auth/forgot-password").await.status(), 200);
    }
    assert_eq!(ctx.get("/auth/forgot-password").await.status(), 429);

    // Other pages are not limited.
    assert_eq!(ctx.get("/health").await.status(), 200);
}
