//! Cart and checkout route handlers.
//!
//! Mutations are plain form posts: the outcome is flashed into the session
//! and the browser is redirected back to a page that re-reads the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::{CartItemId, ProductId};

use crate::backend::types::{AddToCart, Cart, CartItem, PlaceOrder};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireSession, set_flash};
use crate::models::Toast;
use crate::state::AppState;

use super::{Page, PageContext, fetched, mutation_toast};

const CART_PATH: &str = "/cart";
const CHECKOUT_PATH: &str = "/checkout";
const ORDERS_PATH: &str = "/order";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            unit_price: item.price.to_string(),
            line_total: (item.price * item.quantity).to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub is_empty: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.items.iter().map(CartLineView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            is_empty: cart.items.is_empty(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Shipping details submitted at checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub pincode: String,
    pub payment_mode: String,
}

impl CheckoutForm {
    /// Check the shipping details, returning the message to show on failure.
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() || self.address.trim().is_empty() {
            return Err("Please enter your name and address");
        }
        if !is_digits(self.phone.trim(), 10) {
            return Err("Phone number must be 10 digits");
        }
        if !is_digits(self.pincode.trim(), 6) {
            return Err("Pincode must be 6 digits");
        }
        if !matches!(self.payment_mode.as_str(), "cod" | "online") {
            return Err("Please choose a payment mode");
        }
        Ok(())
    }

    fn into_order(self) -> PlaceOrder {
        PlaceOrder {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
            payment_mode: self.payment_mode,
        }
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<CartTemplate, AppError> {
    let cart = fetched(
        state.backend().cart(&current.token).await,
        &session,
        &mut page,
        "your cart",
    )
    .await?;

    Ok(CartTemplate {
        page,
        cart: CartView::from(&cart),
    })
}

/// Add a product to the cart.
#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let line = AddToCart {
        product_id: form.product_id,
        quantity: form.quantity.unwrap_or(1).max(1),
        size: form.size,
        color: form.color,
    };

    let result = state.backend().add_to_cart(&current.token, &line).await;
    let toast = mutation_toast(result, &session, "Added to cart", "Could not add to cart").await?;
    set_flash(&session, &toast).await?;

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(item_id = %form.item_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let result = state
        .backend()
        .remove_from_cart(&current.token, &form.item_id)
        .await;
    let toast = mutation_toast(
        result,
        &session,
        "Removed from cart",
        "Could not remove item",
    )
    .await?;
    set_flash(&session, &toast).await?;

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Display the shipping form with the cart summary.
///
/// An empty cart has nothing to check out and goes back to the cart page.
#[instrument(skip_all)]
pub async fn checkout_page(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<Response, AppError> {
    let toasts_before = page.toasts.len();
    let cart = fetched(
        state.backend().cart(&current.token).await,
        &session,
        &mut page,
        "your cart",
    )
    .await?;
    let load_failed = page.toasts.len() > toasts_before;

    if cart.items.is_empty() && !load_failed {
        set_flash(&session, &Toast::error("Your cart is empty")).await?;
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    Ok(CheckoutTemplate {
        page,
        cart: CartView::from(&cart),
    }
    .into_response())
}

/// Place the order.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    if let Err(message) = form.validate() {
        set_flash(&session, &Toast::error(message)).await?;
        return Ok(Redirect::to(CHECKOUT_PATH).into_response());
    }

    let result = state
        .backend()
        .place_order(&current.token, &form.into_order())
        .await;
    let placed = result.is_ok();
    let toast = mutation_toast(
        result,
        &session,
        "Order placed successfully!",
        "Failed to place order",
    )
    .await?;
    set_flash(&session, &toast).await?;

    if placed {
        add_breadcrumb("orders", "Placed order", None);
        Ok(Redirect::to(ORDERS_PATH).into_response())
    } else {
        Ok(Redirect::to(CHECKOUT_PATH).into_response())
    }
}

#[cfg(test)]
mod tests {
    use marketplace_core::Price;

    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Asha Rao".to_string(),
            address: "12 MG Road, Bengaluru".to_string(),
            phone: "9876543210".to_string(),
            pincode: "560001".to_string(),
            payment_mode: "cod".to_string(),
        }
    }

    #[test]
    fn test_checkout_form_valid() {
        assert_eq!(form().validate(), Ok(()));
    }

    #[test]
    fn test_checkout_form_rejects_bad_fields() {
        let bad_phone = CheckoutForm {
            phone: "98765".to_string(),
            ..form()
        };
        assert_eq!(bad_phone.validate(), Err("Phone number must be 10 digits"));

        let bad_pincode = CheckoutForm {
            pincode: "56000A".to_string(),
            ..form()
        };
        assert_eq!(bad_pincode.validate(), Err("Pincode must be 6 digits"));

        let no_address = CheckoutForm {
            address: "  ".to_string(),
            ..form()
        };
        assert!(no_address.validate().is_err());

        let bad_mode = CheckoutForm {
            payment_mode: "barter".to_string(),
            ..form()
        };
        assert_eq!(bad_mode.validate(), Err("Please choose a payment mode"));
    }

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart {
            items: vec![CartItem {
                id: CartItemId::new("c1"),
                product_id: ProductId::new("p1"),
                name: "Hoodie".to_string(),
                image: String::new(),
                price: Price::rupees(1200),
                quantity: 2,
                size: "L".to_string(),
                color: "Black".to_string(),
            }],
        };
        let view = CartView::from(&cart);
        assert!(!view.is_empty);
        assert_eq!(view.subtotal, "₹2400");
        assert_eq!(view.lines.first().map(|l| l.line_total.as_str()), Some("₹2400"));
    }
}
