//! Wire types for the marketplace backend API.
//!
//! Field names follow the backend's JSON (`_id`, camelCase, and a couple of
//! legacy spellings on order items).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use marketplace_core::{
    CartItemId, ChatId, CouponId, OrderId, OrderStatus, PaymentStatus, Price, ProductId, Role,
    SellerId, UserId,
};

// =============================================================================
// Auth
// =============================================================================

/// The account behind a backend token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration request body.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Response to login and registration.
///
/// Some backend deployments only return the token; the identity is then
/// fetched with `GET /auth/me` on the next request.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Response to `GET /auth/me`.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub user: Identity,
}

/// Generic acknowledgement returned by mutations.
#[derive(Debug, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub seller: Option<SellerId>,
}

/// Body for creating a product.
#[derive(Debug, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub stock: u32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
}

// =============================================================================
// Cart & Checkout
// =============================================================================

/// A line in the shopper's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

/// Response to `GET /cart`.
#[derive(Debug, Default, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(|item| item.price * item.quantity).sum()
    }
}

/// Body for adding a product to the cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

/// Body for placing an order from the cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub pincode: String,
    pub payment_mode: String,
}

// =============================================================================
// Orders
// =============================================================================

/// An order with its shipping identity and line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub name: String,
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub phone: String,
    #[serde(deserialize_with = "string_or_number")]
    pub pincode: String,
    pub user: UserId,
    pub subtotal: Price,
    #[serde(default)]
    pub delivery_fee: Price,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One product line inside an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub amount: Price,
    pub payment_mode: String,
    pub payment_status: PaymentStatus,
    #[serde(rename = "productcount")]
    pub quantity: u32,
    #[serde(rename = "Orderstatus")]
    pub status: OrderStatus,
    #[serde(default)]
    pub image: String,
    pub product: ProductId,
    pub seller: SellerId,
}

/// Body for `PUT /order/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub status: OrderStatus,
}

// =============================================================================
// Reviews
// =============================================================================

/// A product review with the reviewer's details populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: u8,
    pub review: String,
    pub user: UserId,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub product: Option<ProductId>,
}

/// Envelope used by every review listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewList {
    #[serde(default)]
    pub reviews: Vec<Review>,
}

// =============================================================================
// Seller & Admin
// =============================================================================

/// Seller dashboard counters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerStats {
    pub products: u64,
    pub orders: u64,
    pub pending_items: u64,
    pub revenue: Price,
}

/// Admin dashboard counters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminStats {
    pub users: u64,
    pub sellers: u64,
    pub products: u64,
    pub orders: u64,
    pub revenue: Price,
}

/// A registered account as listed on admin screens.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A seller's conversation with a shopper.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    #[serde(rename = "_id")]
    pub id: ChatId,
    pub participant: String,
    #[serde(default)]
    pub last_message: String,
    pub updated_at: DateTime<Utc>,
}

/// A discount coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: CouponId,
    pub code: String,
    pub discount: u8,
    pub expiry: NaiveDate,
}

/// Body for creating a coupon.
#[derive(Debug, Serialize)]
pub struct NewCoupon {
    pub code: String,
    pub discount: u8,
    pub expiry: NaiveDate,
}

/// Accept a JSON string or number and keep its textual form.
///
/// Phone numbers and pincodes arrive as numbers from older backend builds.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_backend_shape() {
        let json = serde_json::json!({
            "_id": "o1",
            "name": "Asha Rao",
            "address": "12 MG Road, Bengaluru",
            "phone": 9876543210u64,
            "pincode": 560001,
            "user": "u1",
            "subtotal": 998,
            "deliveryFee": 40,
            "totalAmount": 1038,
            "createdAt": "2024-05-01T10:30:00.000Z",
            "items": [{
                "name": "Linen Shirt",
                "size": "M",
                "color": "White",
                "amount": 499,
                "paymentMode": "cod",
                "paymentStatus": "pending",
                "productcount": 2,
                "Orderstatus": "Out for Delivery",
                "image": "https://cdn.example.com/shirt.jpg",
                "product": "p1",
                "seller": "s1"
            }]
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.phone, "9876543210");
        assert_eq!(order.pincode, "560001");
        assert_eq!(order.total_amount, Price::rupees(1038));
        let item = order.items.first().unwrap();
        assert_eq!(item.status, OrderStatus::OutForDelivery);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.seller.as_str(), "s1");
    }

    #[test]
    fn test_status_update_body() {
        let body = StatusUpdate {
            order_id: OrderId::new("o1"),
            product_id: ProductId::new("p1"),
            seller_id: SellerId::new("s1"),
            status: OrderStatus::InTransit,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "orderId": "o1",
                "productId": "p1",
                "sellerId": "s1",
                "status": "In Transit"
            })
        );
    }

    #[test]
    fn test_auth_response_without_user() {
        let resp: AuthResponse = serde_json::from_str(r#"{"token":"t"}"#).unwrap();
        assert!(resp.user.is_none());
    }

    #[test]
    fn test_cart_subtotal() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [
                {"_id": "c1", "productId": "p1", "name": "Tee", "price": 300, "quantity": 2},
                {"_id": "c2", "productId": "p2", "name": "Cap", "price": 150, "quantity": 1}
            ]
        }))
        .unwrap();
        assert_eq!(cart.subtotal(), Price::rupees(750));
    }
}
