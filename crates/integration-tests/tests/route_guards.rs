//! Role-gated routing, the public login gate and the not-found fallback.

#![allow(clippy::unwrap_used)]

use marketplace_core::Role;
use marketplace_integration_tests::{TestApp, location};
use reqwest::StatusCode;

// =============================================================================
// Unauthenticated
// =============================================================================

#[tokio::test]
async fn test_unauthenticated_page_redirects_to_auth() {
    let app = TestApp::spawn().await;

    for path in ["/", "/store", "/orders", "/admin", "/coupons"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/auth"), "{path}");
    }
}

#[tokio::test]
async fn test_unauthenticated_htmx_gets_401() {
    let app = TestApp::spawn().await;

    let response = app.get_htmx("/orders").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("HX-Redirect").unwrap(),
        "/auth"
    );
}

#[tokio::test]
async fn test_login_view_renders_for_anonymous() {
    let app = TestApp::spawn().await;

    let response = app.get("/auth").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("name=\"password\""));
}

#[tokio::test]
async fn test_wrong_password_returns_to_login_with_toast() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/auth",
            &[("email", "seller@fabrique.test"), ("password", "nope")],
        )
        .await;
    assert_eq!(location(&response), Some("/auth"));

    let body = app.get("/auth").await.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));
}

// =============================================================================
// Role Areas
// =============================================================================

#[tokio::test]
async fn test_login_redirects_to_role_home() {
    for (role, home) in [(Role::User, "/"), (Role::Seller, "/store"), (Role::Admin, "/admin")] {
        let app = TestApp::spawn().await;
        let response = app.login_as(role).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{role}");
        assert_eq!(location(&response), Some(home), "{role}");
    }
}

#[tokio::test]
async fn test_user_denied_admin_area() {
    let app = TestApp::spawn().await;
    app.login_as(Role::User).await;

    let response = app.get("/admin").await;
    assert_eq!(location(&response), Some("/not-found"));

    let response = app.get("/not-found").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("Page not found"));
}

#[tokio::test]
async fn test_seller_denied_user_and_admin_areas() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Seller).await;

    for path in ["/cart", "/order", "/manage_user", "/reviews/p1"] {
        let response = app.get(path).await;
        assert_eq!(location(&response), Some("/not-found"), "{path}");
    }
}

#[tokio::test]
async fn test_seller_orders_renders() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Seller).await;

    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("id=\"seller-orders\""));
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("Canvas Belt"));
    assert!(body.contains("01/03/2025, 3:30:00 pm"));
}

#[tokio::test]
async fn test_auth_while_logged_in_goes_home() {
    let app = TestApp::spawn().await;
    app.login_as(Role::User).await;

    let response = app.get("/auth").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

// =============================================================================
// Fallback
// =============================================================================

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/definitely/not/here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.login_as(Role::Admin).await;
    let response = app.get("/definitely/not/here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}
