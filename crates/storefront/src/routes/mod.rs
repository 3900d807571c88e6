//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Public (login gate: signed-in sessions go to their role home)
//! GET  /auth                         - Login / registration view
//! POST /auth                         - Login action
//! POST /auth/register                - Registration action
//! POST /auth/logout                  - Logout (any session)
//!
//! # User
//! GET  /                             - Home: featured products, reviews
//! GET  /products[?q=]                - Catalog (q redirects to a category)
//! GET  /products/{category}          - Catalog filtered by category
//! GET  /product/{product_id}         - Product detail with reviews
//! GET  /cart                         - Cart
//! POST /cart/add, /cart/remove       - Cart mutations
//! GET  /checkout, POST /checkout     - Shipping form, place order
//! GET  /order                        - Order history
//! GET  /invoice?order_id=            - Invoice for one order
//!
//! # Seller
//! GET  /store                        - Dashboard
//! GET  /manageproduct                - Product list
//! POST /manageproduct/{id}/delete    - Delete product
//! GET  /orders                       - Orders with per-line status
//! POST /orders/status                - Update a line's status (htmx)
//! GET  /orders/{id}/items/{i}/print  - Printable slip
//! GET  /reviews, /chats              - Reviews and chat threads
//! GET  /addproduct, POST /addproduct - New product
//!
//! # Admin
//! GET  /admin                        - Dashboard
//! GET  /manage_product, /manage_user, /manage_seller
//! GET  /reviews/{_id}                - Reviews for a product
//! GET  /coupons, POST /coupons       - Coupons
//! POST /coupons/{id}/delete          - Delete coupon
//!
//! # Anything else
//!                                    - Not-found view (404)
//! ```
//!
//! Each role area is its own router behind [`require_role`]; the table in
//! [`crate::navigation::ROUTES`] lists the same paths.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;
pub mod products;
pub mod seller;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, Utc};
use tower_sessions::Session;

use marketplace_core::Role;

use crate::backend::BackendError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{
    GuardState, RequireSession, auth_rate_limiter, public_gate, require_role, take_flash,
};
use crate::models::Toast;
use crate::navigation::{AUTH_PATH, Area, MenuItem, menu_for};
use crate::state::AppState;

// =============================================================================
// Page Context
// =============================================================================

/// Shop categories shown in the shopper navigation, as (label, slug).
pub const CATEGORIES: &[(&str, &str)] = &[
    ("T-Shirts", "t-shirts"),
    ("Shirts", "shirts"),
    ("Jeans", "jeans"),
    ("Trousers", "trousers"),
    ("Innerwear", "innerwear"),
    ("Footwear", "footwear"),
    ("Accessories", "accessories"),
    ("Hoodies", "hoodies"),
    ("Jackets", "jackets"),
    ("Kurta", "kurta"),
];

/// Layout data shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub user_name: String,
    pub role: Role,
    pub menu: Vec<MenuItem>,
    pub toasts: Vec<Toast>,
}

impl PageContext {
    #[must_use]
    pub fn new(user_name: &str, role: Role, path: &str, flash: Option<Toast>) -> Self {
        Self {
            user_name: user_name.to_string(),
            role,
            menu: menu_for(role, path),
            toasts: flash.into_iter().collect(),
        }
    }

    /// Add a toast to this render.
    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    /// Subtitle next to the brand.
    #[must_use]
    pub const fn console(&self) -> &'static str {
        match self.role {
            Role::User => "",
            Role::Seller => "Seller Console",
            Role::Admin => "Admin Console",
        }
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.role, Role::User)
    }

    /// Category links for the shopper layout.
    #[must_use]
    pub const fn categories(&self) -> &'static [(&'static str, &'static str)] {
        CATEGORIES
    }
}

/// Extractor for the layout context of a guarded page.
///
/// Consumes the session's flash toast.
pub struct Page(pub PageContext);

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(current) = RequireSession::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let flash = take_flash(&session).await;
        Ok(Self(PageContext::new(
            &current.identity.name,
            current.identity.role,
            parts.uri.path(),
            flash,
        )))
    }
}

// =============================================================================
// Backend Result Helpers
// =============================================================================

/// Settle a backend read for a page.
///
/// A failed read is logged and rendered as the page's empty state with an
/// error toast. A rejected token destroys the session and ends the request.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` when the backend answers 401.
pub async fn fetched<T: Default>(
    result: Result<T, BackendError>,
    session: &Session,
    page: &mut PageContext,
    what: &str,
) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(BackendError::Unauthorized) => Err(expire(session).await),
        Err(e) => {
            tracing::warn!(error = %e, what, "Backend fetch failed");
            page.push(Toast::error(format!("Could not load {what}")));
            Ok(T::default())
        }
    }
}

/// Turn a backend mutation result into the toast to show.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` when the backend answers 401.
pub async fn mutation_toast(
    result: Result<(), BackendError>,
    session: &Session,
    success: &str,
    failure: &str,
) -> Result<Toast, AppError> {
    match result {
        Ok(()) => Ok(Toast::success(success)),
        Err(BackendError::Unauthorized) => Err(expire(session).await),
        Err(e) => {
            tracing::warn!(error = %e, "Backend mutation failed");
            Ok(Toast::error(failure))
        }
    }
}

/// Settle a backend read the page cannot render without.
///
/// `Ok(None)` means the backend has no such record.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` when the backend answers 401, and the
/// backend error for any other failure.
pub async fn found<T>(
    result: Result<T, BackendError>,
    session: &Session,
) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(BackendError::NotFound(_)) => Ok(None),
        Err(BackendError::Unauthorized) => Err(expire(session).await),
        Err(e) => Err(e.into()),
    }
}

/// Destroy a session whose token the backend no longer accepts.
pub(crate) async fn expire(session: &Session) -> AppError {
    tracing::info!("Backend rejected token mid-request, clearing session");
    if let Err(e) = session.flush().await {
        return AppError::Session(e);
    }
    AppError::SessionExpired
}

/// Order timestamps as shown to Indian shoppers and sellers (IST,
/// day-first, 12-hour clock).
#[must_use]
pub fn display_datetime(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%d/%m/%Y, %-I:%M:%S %P";
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

// =============================================================================
// Not Found
// =============================================================================

/// Not-found view.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub auth_path: &'static str,
}

/// Wildcard fallback: every unmatched path, including the not-found path.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            auth_path: AUTH_PATH,
        },
    )
        .into_response()
}

// =============================================================================
// Router Composition
// =============================================================================

/// Put an area's router behind its access rule.
fn gate(router: Router<AppState>, state: &AppState, area: Area) -> Router<AppState> {
    match area.requirement() {
        Some(requirement) => router.route_layer(middleware::from_fn_with_state(
            GuardState::new(state.clone(), requirement),
            require_role,
        )),
        None => router.route_layer(middleware::from_fn_with_state(state.clone(), public_gate)),
    }
}

/// Public routes: the login view and its form posts.
fn public_routes(state: &AppState) -> Router<AppState> {
    let mut login = post(auth::login);
    let mut register = post(auth::register);

    if state.config().auth_rate_limit {
        let limiter = auth_rate_limiter();
        login = login.layer(limiter.clone());
        register = register.layer(limiter);
    }

    Router::new()
        .route(AUTH_PATH, get(auth::page).merge(login))
        .route("/auth/register", register)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/{category}", get(products::category))
        .route("/product/{product_id}", get(products::show))
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/remove", post(cart::remove))
        .route("/checkout", get(cart::checkout_page).post(cart::checkout))
        .route("/order", get(orders::history))
        .route("/invoice", get(orders::invoice))
}

fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/store", get(seller::dashboard))
        .route("/manageproduct", get(seller::catalog::index))
        .route(
            "/manageproduct/{product_id}/delete",
            post(seller::catalog::delete),
        )
        .route("/addproduct", get(seller::catalog::new).post(seller::catalog::create))
        .route("/orders", get(seller::orders::index))
        .route("/orders/status", post(seller::orders::update_status))
        .route(
            "/orders/{order_id}/items/{index}/print",
            get(seller::orders::print),
        )
        .route("/reviews", get(seller::reviews))
        .route("/chats", get(seller::chats))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/manage_product", get(admin::products))
        .route("/manage_user", get(admin::users))
        .route("/manage_seller", get(admin::sellers))
        .route("/reviews/{_id}", get(admin::product_reviews))
        .route("/coupons", get(admin::coupons).post(admin::create_coupon))
        .route("/coupons/{coupon_id}/delete", post(admin::delete_coupon))
}

/// Compose every page route.
///
/// Logout sits outside the gates so any session can end itself. Unmatched
/// paths fall through to [`not_found`] without touching a guard.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(gate(public_routes(state), state, Area::Public))
        .merge(gate(user_routes(), state, Area::User))
        .merge(gate(seller_routes(), state, Area::Seller))
        .merge(gate(admin_routes(), state, Area::Admin))
        .route("/auth/logout", post(auth::logout))
        .fallback(not_found)
}
