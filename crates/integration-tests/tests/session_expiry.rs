//! Sessions end when the backend stops accepting their token, or on logout.

#![allow(clippy::unwrap_used)]

use marketplace_core::Role;
use marketplace_integration_tests::{TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_backend_401_flushes_session() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Seller).await;
    assert_eq!(app.get("/orders").await.status(), StatusCode::OK);

    app.backend.revoke_tokens();
    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth"));

    // The session is gone, not just this request
    app.backend.restore_tokens();
    let response = app.get("/orders").await;
    assert_eq!(location(&response), Some("/auth"));

    let response = app.get("/auth").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_401_during_status_update_flushes_session() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Seller).await;

    app.backend.revoke_tokens();
    let response = app
        .post_htmx(
            "/orders/status",
            &[
                ("order_id", "o1"),
                ("product_id", "p1"),
                ("seller_id", "s1"),
                ("status", "Confirmed"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/auth"
    );
    assert!(location(&response).is_none());

    app.backend.restore_tokens();
    assert_eq!(location(&app.get("/store").await), Some("/auth"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), Some("/auth"));

    let response = app.get("/admin").await;
    assert_eq!(location(&response), Some("/auth"));
}
