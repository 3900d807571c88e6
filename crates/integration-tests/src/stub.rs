//! Stub marketplace backend.
//!
//! Serves the slice of the backend API the storefront calls in tests, with
//! one seller order of two lines. Tests flip switches on it to make the
//! backend reject status changes or revoke every token.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};

#[derive(Default)]
struct StubState {
    orders: Vec<Value>,
    reject_status_updates: bool,
    revoked: bool,
    order_reads: usize,
    me_reads: usize,
    role_override: Option<String>,
    status_updates: Vec<Value>,
}

type Shared = Arc<Mutex<StubState>>;

/// Handle to a running stub backend.
#[derive(Clone)]
pub struct StubBackend {
    addr: SocketAddr,
    state: Shared,
}

impl StubBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState {
            orders: vec![seed_order()],
            ..StubState::default()
        }));

        let api = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/logout", post(logout))
            .route("/order/seller", get(seller_orders))
            .route("/order/status", put(update_status))
            .route("/product", get(empty_list))
            .route("/review", get(empty_reviews))
            .with_state(state.clone());
        let router = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend address");
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("stub backend server");
        });

        Self { addr, state }
    }

    /// Base URL the storefront should call.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state poisoned")
    }

    /// Answer every status change with `success: false`.
    pub fn reject_status_updates(&self) {
        self.lock().reject_status_updates = true;
    }

    /// Answer 401 for every token.
    pub fn revoke_tokens(&self) {
        self.lock().revoked = true;
    }

    /// Accept tokens again.
    pub fn restore_tokens(&self) {
        self.lock().revoked = false;
    }

    /// Report `role` from the identity check whatever the token says.
    pub fn report_role(&self, role: &str) {
        self.lock().role_override = Some(role.to_string());
    }

    /// How many identity checks reached the backend.
    #[must_use]
    pub fn me_reads(&self) -> usize {
        self.lock().me_reads
    }

    /// How many times the seller order list was read.
    #[must_use]
    pub fn order_reads(&self) -> usize {
        self.lock().order_reads
    }

    /// Status change bodies received, accepted or not.
    #[must_use]
    pub fn status_updates(&self) -> Vec<Value> {
        self.lock().status_updates.clone()
    }

    /// Stored status of line `index` in order `order_id`.
    #[must_use]
    pub fn line_status(&self, order_id: &str, index: usize) -> Option<String> {
        self.lock()
            .orders
            .iter()
            .find(|order| order["_id"] == order_id)
            .and_then(|order| order["items"].get(index))
            .and_then(|item| item["Orderstatus"].as_str())
            .map(String::from)
    }
}

fn seed_order() -> Value {
    json!({
        "_id": "o1",
        "name": "Asha Rao",
        "address": "12 MG Road, Bengaluru",
        "phone": 9_876_543_210_u64,
        "pincode": 560_001,
        "user": "u1",
        "subtotal": 1498,
        "deliveryFee": 0,
        "totalAmount": 1498,
        "createdAt": "2025-03-01T10:00:00.000Z",
        "items": [
            {
                "name": "Linen Shirt",
                "size": "M",
                "color": "White",
                "amount": 999,
                "paymentMode": "cod",
                "paymentStatus": "pending",
                "productcount": 1,
                "Orderstatus": "Pending",
                "product": "p1",
                "seller": "s1"
            },
            {
                "name": "Canvas Belt",
                "size": "Free",
                "color": "Tan",
                "amount": 499,
                "paymentMode": "online",
                "paymentStatus": "completed",
                "productcount": 1,
                "Orderstatus": "Confirmed",
                "product": "p2",
                "seller": "s1"
            }
        ]
    })
}

fn identity(role: &str) -> Value {
    json!({
        "_id": format!("{role}-1"),
        "name": format!("Test {role}"),
        "email": format!("{role}@fabrique.test"),
        "role": role,
    })
}

/// Role named by a `token-<role>` bearer token, unless tokens are revoked.
fn caller(state: &Shared, headers: &HeaderMap) -> Result<String, StatusCode> {
    let revoked = state.lock().map_or(true, |s| s.revoked);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer token-"))
        .filter(|_| !revoked)
        .map(String::from)
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let role = match email.split('@').next() {
        Some("seller") => "seller",
        Some("admin") => "admin",
        Some("user") => "user",
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    };
    if body["password"] != crate::PASSWORD {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(json!({ "token": format!("token-{role}"), "user": identity(role) })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let role = match caller(&state, &headers) {
        Ok(role) => role,
        Err(status) => return status.into_response(),
    };
    let mut stub = state.lock().expect("stub state poisoned");
    stub.me_reads += 1;
    let role = stub.role_override.clone().unwrap_or(role);
    Json(json!({ "user": identity(&role) })).into_response()
}

async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn seller_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(status) = caller(&state, &headers) {
        return status.into_response();
    }
    let mut stub = state.lock().expect("stub state poisoned");
    stub.order_reads += 1;
    Json(Value::Array(stub.orders.clone())).into_response()
}

async fn update_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(status) = caller(&state, &headers) {
        return status.into_response();
    }
    let mut stub = state.lock().expect("stub state poisoned");
    stub.status_updates.push(body.clone());

    if stub.reject_status_updates {
        return Json(json!({ "success": false, "message": "Order not found" })).into_response();
    }

    let item = stub
        .orders
        .iter_mut()
        .filter(|order| order["_id"] == body["orderId"])
        .filter_map(|order| order["items"].as_array_mut())
        .flatten()
        .find(|item| item["product"] == body["productId"] && item["seller"] == body["sellerId"]);

    match item {
        Some(item) => {
            item["Orderstatus"] = body["status"].clone();
            Json(json!({ "success": true })).into_response()
        }
        None => Json(json!({ "success": false, "message": "Order not found" })).into_response(),
    }
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn empty_reviews() -> Json<Value> {
    Json(json!({ "reviews": [] }))
}
