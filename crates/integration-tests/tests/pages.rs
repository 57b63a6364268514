//! Profile pages, role menus, and the 404 page as a browser sees them.

use courier_core::Role;
use courier_integration_tests::{TestContext, customer, location};
use serde_json::json;

#[tokio::test]
async fn test_customer_profile_page() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Customer, customer(15)).await;

    let mut stored = customer(15);
    stored["branch"] = json!("Montego Bay");
    stored["mailbox_address"] =
        json!("3750 NW 28th Street, Unit 104, Miami, FL 33142, CPX Montego Bay 15");
    ctx.mock_profile(stored).await;
    ctx.mock_stats(
        "/api/users/me/stats",
        json!({ "total_packages": 12, "in_transit": 3, "ready_for_pickup": 1, "delivered": 8 }),
    )
    .await;

    let resp = ctx.get("/profile").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();

    assert!(body.contains("Keisha Brown"));
    assert!(body.contains("CPX Montego Bay 15"));
    assert!(body.contains("Member since March 2024"));
    assert!(body.contains("Ready for pickup"));
    assert!(body.contains(r#"href="/settings""#));
    assert!(!body.contains("/admin/profile"));
}

#[tokio::test]
async fn test_profile_survives_stats_outage() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Customer, customer(15)).await;
    ctx.mock_profile(customer(15)).await;
    // No stats mock: wiremock answers 404.

    let body = ctx.get("/profile").await.text().await.unwrap();
    assert!(body.contains("Keisha Brown"));
    assert!(body.contains("Package counts are unavailable right now."));
}

#[tokio::test]
async fn test_customer_cannot_open_dashboard() {
    let ctx = TestContext::start().await;
    ctx.login_as(Role::Customer, customer(15)).await;

    let resp = ctx.get("/admin/profile").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/profile");
}

#[tokio::test]
async fn test_dashboard_cards_follow_role() {
    let stats = json!({
        "total_customers": 4210,
        "total_packages": 98000,
        "packages_in_transit": 310,
        "pending_verifications": 17
    });

    let cases = [
        (Role::Staff, false, false),
        (Role::Admin, true, false),
        (Role::SuperAdmin, true, true),
    ];

    for (role, customers, verifications) in cases {
        let ctx = TestContext::start().await;
        ctx.login_as(role, customer(2)).await;
        ctx.mock_profile(customer(2)).await;
        ctx.mock_stats("/api/admin/stats", stats.clone()).await;

        let body = ctx.get("/admin/profile").await.text().await.unwrap();
        assert!(body.contains("98,000"), "{role}");
        assert_eq!(body.contains(r#"id="customers""#), customers, "{role}");
        assert_eq!(body.contains(r#"id="verifications""#), verifications, "{role}");
        assert_eq!(
            body.contains(r#"href="/admin/profile#verifications""#),
            verifications,
            "{role}"
        );
        assert!(body.contains(r#"href="/admin/settings#password""#), "{role}");
        assert!(body.contains(role.label()), "{role}");
    }
}

#[tokio::test]
async fn test_not_found_page() {
    let ctx = TestContext::start().await;

    let resp = ctx.get("/definitely/not/here").await;
    assert_eq!(resp.status(), 404);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Page not found"));
    assert!(body.contains(r#"href="/auth/login""#));
}

#[tokio::test]
async fn test_static_css_is_served() {
    let ctx = TestContext::start().await;
    let resp = ctx.get("/static/css/main.css").await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(".stat-card"));
}
