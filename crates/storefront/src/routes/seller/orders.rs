//! Seller order handlers: per-line status updates and printable slips.
//!
//! A status change is sent to the backend and, when accepted, the whole
//! order list is fetched again and re-rendered. Nothing is merged locally,
//! so the list always shows what the backend holds. A rejected change leaves
//! the rendered list alone and only shows an error toast.
//!
//! htmx posts get fragments back; plain form posts get a flash toast and a
//! redirect to the order list.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::{OrderId, OrderStatus, ProductId, SellerId};

use crate::backend::BackendError;
use crate::backend::types::{Order, OrderItem, StatusUpdate};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireSession, set_flash};
use crate::models::{Toast, ToastKind};
use crate::routes::orders::{OrderView, has_lines};
use crate::routes::{
    Page, PageContext, display_datetime, expire, fetched, found, is_htmx, mutation_toast,
    not_found,
};
use crate::state::AppState;

const ORDERS_PATH: &str = "/orders";

const STATUS_UPDATED: &str = "Order status updated!";
const STATUS_FAILED: &str = "Failed to update order status";

/// Client event telling selectors to fall back to their last saved value.
const REJECTED_EVENT: &str = "orderStatusRejected";

// =============================================================================
// Templates
// =============================================================================

/// Seller orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
    pub has_lines: bool,
}

/// Re-rendered order list plus out-of-band toasts, after an accepted update.
#[derive(Template, WebTemplate)]
#[template(path = "partials/seller_orders_update.html")]
pub struct OrdersUpdateTemplate {
    pub orders: Vec<OrderView>,
    pub has_lines: bool,
    pub toasts: Vec<Toast>,
}

/// Out-of-band toasts only.
#[derive(Template, WebTemplate)]
#[template(path = "partials/toasts_oob.html")]
pub struct ToastsOobTemplate {
    pub toasts: Vec<Toast>,
}

/// Status change for one order line.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub status: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display every order containing the seller's products.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<OrdersTemplate, AppError> {
    let orders = fetched(
        state.backend().seller_orders(&current.token).await,
        &session,
        &mut page,
        "orders",
    )
    .await?;

    let orders: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
    Ok(OrdersTemplate {
        page,
        has_lines: has_lines(&orders),
        orders,
    })
}

/// Update the status of one order line, then refetch the list.
#[instrument(
    skip_all,
    fields(order_id = %form.order_id, product_id = %form.product_id, status = %form.status)
)]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    headers: HeaderMap,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let toast = match OrderStatus::from_str(&form.status) {
        Ok(status) => {
            let update = StatusUpdate {
                order_id: form.order_id,
                product_id: form.product_id,
                seller_id: form.seller_id,
                status,
            };
            let result = state
                .backend()
                .update_order_status(&current.token, &update)
                .await;
            mutation_toast(result, &session, STATUS_UPDATED, STATUS_FAILED).await?
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected unknown order status");
            Toast::error(STATUS_FAILED)
        }
    };

    let accepted = toast.kind == ToastKind::Success;
    if accepted {
        add_breadcrumb(
            "orders",
            "Updated line status",
            Some(&[("status", form.status.as_str())]),
        );
    }

    if !is_htmx(&headers) {
        set_flash(&session, &toast).await?;
        return Ok(Redirect::to(ORDERS_PATH).into_response());
    }

    if !accepted {
        return Ok(keep_list(vec![toast]));
    }

    match state.backend().seller_orders(&current.token).await {
        Ok(orders) => {
            let orders: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
            Ok(OrdersUpdateTemplate {
                has_lines: has_lines(&orders),
                orders,
                toasts: vec![toast],
            }
            .into_response())
        }
        Err(BackendError::Unauthorized) => Err(expire(&session).await),
        Err(e) => {
            tracing::warn!(error = %e, "Refetch after status update failed");
            Ok(keep_list(vec![toast, Toast::error("Could not load orders")]))
        }
    }
}

/// Serve the printable slip for one order line.
///
/// Lines still pending have nothing to ship and get no slip.
#[instrument(skip_all, fields(order_id = %order_id, index))]
pub async fn print(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Path((order_id, index)): Path<(OrderId, usize)>,
) -> Result<Response, AppError> {
    let orders = found(state.backend().seller_orders(&current.token).await, &session)
        .await?
        .unwrap_or_default();

    let Some((order, item)) = orders
        .iter()
        .find(|order| order.id == order_id)
        .and_then(|order| order.items.get(index).map(|item| (order, item)))
    else {
        return Ok(not_found().await);
    };

    if item.status.is_pending() {
        return Err(AppError::Conflict(
            "Confirm the order before printing its slip".to_string(),
        ));
    }

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        print_slip(order, item),
    )
        .into_response())
}

// =============================================================================
// Helpers
// =============================================================================

/// Leave the rendered list untouched and reset the selectors client-side.
fn keep_list(toasts: Vec<Toast>) -> Response {
    (
        AppendHeaders([("HX-Reswap", "none"), ("HX-Trigger", REJECTED_EVENT)]),
        ToastsOobTemplate { toasts },
    )
        .into_response()
}

/// Plain-text packing slip for one order line.
fn print_slip(order: &Order, item: &OrderItem) -> String {
    const RULE: &str = "----------------------------------------";

    format!(
        "Order ID: {id}\n\
         Date: {date}\n\
         {RULE}\n\
         Product: {name}\n\
         Size: {size}\n\
         Color: {color}\n\
         Quantity: {quantity}\n\
         Price: {amount}\n\
         Payment Mode: {mode}\n\
         Payment Status: {payment}\n\
         Order Status: {status}\n\
         {RULE}\n\
         Shipping To:\n\
         {ship_name}\n\
         {address}\n\
         Pincode: {pincode}\n\
         Phone: {phone}\n\
         {RULE}\n\
         Total: {total}\n",
        id = order.id,
        date = display_datetime(order.created_at),
        name = item.name,
        size = item.size,
        color = item.color,
        quantity = item.quantity,
        amount = item.amount,
        mode = item.payment_mode,
        payment = item.payment_status,
        status = item.status,
        ship_name = order.name,
        address = order.address,
        pincode = order.pincode,
        phone = order.phone,
        total = order.total_amount,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use marketplace_core::{PaymentStatus, Price, UserId};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new("665f1c"),
            name: "Ravi Kumar".to_string(),
            address: "4 Park Street, Kolkata".to_string(),
            phone: "9123456780".to_string(),
            pincode: "700016".to_string(),
            user: UserId::new("u9"),
            subtotal: Price::rupees(1299),
            delivery_fee: Price::ZERO,
            total_amount: Price::rupees(1299),
            created_at: Utc.with_ymd_and_hms(2025, 1, 20, 18, 45, 0).unwrap(),
            items: vec![OrderItem {
                name: "Denim Jacket".to_string(),
                size: "L".to_string(),
                color: "Indigo".to_string(),
                amount: Price::rupees(1299),
                payment_mode: "online".to_string(),
                payment_status: PaymentStatus::Completed,
                quantity: 1,
                status: OrderStatus::Confirmed,
                image: String::new(),
                product: ProductId::new("p7"),
                seller: SellerId::new("s3"),
            }],
        }
    }

    #[test]
    fn test_print_slip_layout() {
        let order = order();
        let slip = print_slip(&order, order.items.first().unwrap());
        let lines: Vec<&str> = slip.lines().collect();

        assert_eq!(lines.first(), Some(&"Order ID: 665f1c"));
        assert_eq!(lines.get(1), Some(&"Date: 21/01/2025, 12:15:00 am"));
        assert!(slip.contains("Price: ₹1299\n"));
        assert!(slip.contains("Payment Status: completed\n"));
        assert!(slip.contains("Order Status: Confirmed\n"));
        assert!(slip.contains("Shipping To:\nRavi Kumar\n4 Park Street, Kolkata\nPincode: 700016\n"));
        assert_eq!(lines.last(), Some(&"Total: ₹1299"));
    }

    #[test]
    fn test_keep_list_headers() {
        let response = keep_list(vec![Toast::error(STATUS_FAILED)]);
        assert_eq!(response.headers().get("HX-Reswap").unwrap(), "none");
        assert_eq!(response.headers().get("HX-Trigger").unwrap(), REJECTED_EVENT);
    }
}
