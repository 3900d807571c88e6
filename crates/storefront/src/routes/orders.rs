//! Shopper order history and invoice handlers.
//!
//! Also defines the order display types the seller console reuses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::{OrderId, OrderStatus, PaymentStatus};

use crate::backend::types::{Order, OrderItem};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireSession;
use crate::state::AppState;

use super::{Page, PageContext, display_datetime, fetched, found, not_found};

// =============================================================================
// View Types
// =============================================================================

/// One choice in a line's status selector.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderLineView {
    /// Position of the line within its order.
    pub index: usize,
    pub name: String,
    pub image: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub amount: String,
    pub payment_mode: String,
    pub payment_status: &'static str,
    pub payment_completed: bool,
    pub status: &'static str,
    pub is_pending: bool,
    pub product_id: String,
    pub seller_id: String,
    pub status_options: Vec<StatusOption>,
}

impl OrderLineView {
    fn new(index: usize, item: &OrderItem) -> Self {
        Self {
            index,
            name: item.name.clone(),
            image: item.image.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            amount: item.amount.to_string(),
            payment_mode: item.payment_mode.to_uppercase(),
            payment_status: item.payment_status.label(),
            payment_completed: item.payment_status == PaymentStatus::Completed,
            status: item.status.label(),
            is_pending: item.status.is_pending(),
            product_id: item.product.to_string(),
            seller_id: item.seller.to_string(),
            status_options: OrderStatus::ALL
                .into_iter()
                .map(|status| StatusOption {
                    value: status.label(),
                    selected: status == item.status,
                })
                .collect(),
        }
    }
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub placed_at: String,
    pub name: String,
    pub address: String,
    pub pincode: String,
    pub phone: String,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub lines: Vec<OrderLineView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            placed_at: display_datetime(order.created_at),
            name: order.name.clone(),
            address: order.address.clone(),
            pincode: order.pincode.clone(),
            phone: order.phone.clone(),
            subtotal: order.subtotal.to_string(),
            delivery_fee: order.delivery_fee.to_string(),
            total: order.total_amount.to_string(),
            lines: order
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| OrderLineView::new(index, item))
                .collect(),
        }
    }
}

/// Whether any order has at least one line.
#[must_use]
pub fn has_lines(orders: &[OrderView]) -> bool {
    orders.iter().any(|order| !order.lines.is_empty())
}

// =============================================================================
// Templates
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
    pub has_lines: bool,
}

/// Invoice page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/invoice.html")]
pub struct InvoiceTemplate {
    pub page: PageContext,
    pub order: OrderView,
}

/// Invoice query parameters.
#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub order_id: Option<OrderId>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the shopper's orders.
#[instrument(skip_all)]
pub async fn history(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<OrdersTemplate, AppError> {
    let orders = fetched(
        state.backend().user_orders(&current.token).await,
        &session,
        &mut page,
        "your orders",
    )
    .await?;

    let orders: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
    Ok(OrdersTemplate {
        page,
        has_lines: has_lines(&orders),
        orders,
    })
}

/// Display the invoice for one of the shopper's orders.
///
/// Orders belonging to someone else are indistinguishable from missing ones.
#[instrument(skip_all)]
pub async fn invoice(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(page): Page,
    Query(query): Query<InvoiceQuery>,
) -> Result<Response, AppError> {
    let Some(order_id) = query.order_id else {
        return Ok(not_found().await);
    };

    let orders = found(state.backend().user_orders(&current.token).await, &session)
        .await?
        .unwrap_or_default();

    let Some(order) = orders.iter().find(|order| order.id == order_id) else {
        tracing::debug!(order_id = %order_id, "Invoice for unknown order");
        return Ok(not_found().await);
    };

    Ok(InvoiceTemplate {
        page,
        order: OrderView::from(order),
    }
    .into_response())
}
