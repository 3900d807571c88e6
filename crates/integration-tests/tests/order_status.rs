//! Seller order status updates: update, refetch, toast.

#![allow(clippy::unwrap_used)]

use marketplace_core::Role;
use marketplace_integration_tests::{TestApp, location};
use reqwest::StatusCode;

fn change(status: &str) -> [(&str, &str); 4] {
    [
        ("order_id", "o1"),
        ("product_id", "p1"),
        ("seller_id", "s1"),
        ("status", status),
    ]
}

async fn seller_app() -> TestApp {
    let app = TestApp::spawn().await;
    app.login_as(Role::Seller).await;
    app
}

#[tokio::test]
async fn test_accepted_update_refetches_and_toasts() {
    let app = seller_app().await;
    app.get("/orders").await;
    assert_eq!(app.backend.order_reads(), 1);

    let response = app.post_htmx("/orders/status", &change("Dispatched")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("HX-Reswap").is_none());

    let body = response.text().await.unwrap();
    assert!(body.contains("id=\"seller-orders\""));
    assert!(body.contains("<option value=\"Dispatched\" selected>"));
    assert!(body.contains("hx-swap-oob"));
    assert!(body.contains("Order status updated!"));

    assert_eq!(app.backend.order_reads(), 2);
    assert_eq!(app.backend.line_status("o1", 0).as_deref(), Some("Dispatched"));
    let updates = app.backend.status_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates.first().unwrap()["status"], "Dispatched");
}

#[tokio::test]
async fn test_rejected_update_keeps_list() {
    let app = seller_app().await;
    app.backend.reject_status_updates();

    let response = app.post_htmx("/orders/status", &change("Delivered")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Reswap").unwrap(), "none");
    assert_eq!(
        response.headers().get("HX-Trigger").unwrap(),
        "orderStatusRejected"
    );

    let body = response.text().await.unwrap();
    assert!(body.contains("Failed to update order status"));
    assert!(!body.contains("seller-orders"));

    assert_eq!(app.backend.order_reads(), 0);
    assert_eq!(app.backend.line_status("o1", 0).as_deref(), Some("Pending"));

    let page = app.get("/orders").await.text().await.unwrap();
    assert!(page.contains("<option value=\"Pending\" selected>"));
}

#[tokio::test]
async fn test_unknown_status_never_reaches_backend() {
    let app = seller_app().await;

    let response = app.post_htmx("/orders/status", &change("Lost")).await;
    assert_eq!(response.headers().get("HX-Reswap").unwrap(), "none");
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Failed to update order status"));
    assert!(app.backend.status_updates().is_empty());
}

#[tokio::test]
async fn test_plain_post_flashes_and_redirects() {
    let app = seller_app().await;

    let response = app.post_form("/orders/status", &change("In Transit")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/orders"));

    let body = app.get("/orders").await.text().await.unwrap();
    assert!(body.contains("Order status updated!"));
    assert!(body.contains("<option value=\"In Transit\" selected>"));

    // Flash is shown once
    let body = app.get("/orders").await.text().await.unwrap();
    assert!(!body.contains("Order status updated!"));
}

#[tokio::test]
async fn test_last_write_wins() {
    let app = seller_app().await;

    app.post_htmx("/orders/status", &change("Delivered")).await;
    app.post_htmx("/orders/status", &change("Confirmed")).await;

    assert_eq!(app.backend.line_status("o1", 0).as_deref(), Some("Confirmed"));
}

#[tokio::test]
async fn test_print_slip_requires_confirmed_line() {
    let app = seller_app().await;

    let response = app.get("/orders/o1/items/0/print").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.get("/orders/o1/items/1/print").await;
    assert_eq!(response.status(), StatusCode::OK);
    let slip = response.text().await.unwrap();
    assert!(slip.starts_with("Order ID: o1\n"));
    assert!(slip.contains("Product: Canvas Belt\n"));

    let response = app.get("/orders/o1/items/9/print").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
