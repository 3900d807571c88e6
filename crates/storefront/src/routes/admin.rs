//! Admin console route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::{CouponId, ProductId};

use crate::backend::types::{Account, AdminStats, Coupon, NewCoupon};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireSession, set_flash};
use crate::models::Toast;
use crate::state::AppState;

use super::products::{ProductView, ReviewView};
use super::{Page, PageContext, fetched, mutation_toast};

const COUPONS_PATH: &str = "/coupons";

/// Largest discount a coupon may carry, in percent.
const MAX_DISCOUNT: u8 = 90;

// =============================================================================
// View Types
// =============================================================================

/// Marketplace counters for templates.
#[derive(Clone)]
pub struct AdminStatsView {
    pub users: u64,
    pub sellers: u64,
    pub products: u64,
    pub orders: u64,
    pub revenue: String,
}

impl From<&AdminStats> for AdminStatsView {
    fn from(stats: &AdminStats) -> Self {
        Self {
            users: stats.users,
            sellers: stats.sellers,
            products: stats.products,
            orders: stats.orders,
            revenue: stats.revenue.to_string(),
        }
    }
}

/// Account row for templates.
#[derive(Clone)]
pub struct AccountView {
    pub name: String,
    pub email: String,
    pub store_name: String,
    pub joined: String,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
            store_name: account.store_name.clone().unwrap_or_default(),
            joined: account
                .created_at
                .map(|at| at.format("%d %b %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Coupon row for templates.
#[derive(Clone)]
pub struct CouponView {
    pub id: String,
    pub code: String,
    pub discount: u8,
    pub expiry: String,
    pub expired: bool,
}

impl CouponView {
    fn new(coupon: &Coupon, today: NaiveDate) -> Self {
        Self {
            id: coupon.id.to_string(),
            code: coupon.code.clone(),
            discount: coupon.discount,
            expiry: coupon.expiry.format("%d %b %Y").to_string(),
            expired: coupon.expiry < today,
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// New coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
    pub discount: u8,
    pub expiry: NaiveDate,
}

impl CouponForm {
    /// Validate the form into a backend request, or the message to show.
    fn parse(self, today: NaiveDate) -> Result<NewCoupon, &'static str> {
        let code = self.code.trim().to_ascii_uppercase();
        if !(3..=20).contains(&code.len()) || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err("Coupon code must be 3-20 letters or digits");
        }
        if self.discount == 0 || self.discount > MAX_DISCOUNT {
            return Err("Discount must be between 1 and 90 percent");
        }
        if self.expiry < today {
            return Err("Expiry date is in the past");
        }
        Ok(NewCoupon {
            code,
            discount: self.discount,
            expiry: self.expiry,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub stats: AdminStatsView,
}

/// Marketplace product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
}

/// Account list template, shared by the user and seller screens.
#[derive(Template, WebTemplate)]
#[template(path = "admin/accounts.html")]
pub struct AccountsTemplate {
    pub page: PageContext,
    pub heading: &'static str,
    pub sellers: bool,
    pub accounts: Vec<AccountView>,
}

/// Reviews for one product.
#[derive(Template, WebTemplate)]
#[template(path = "admin/reviews.html")]
pub struct ReviewsTemplate {
    pub page: PageContext,
    pub product_id: String,
    pub reviews: Vec<ReviewView>,
}

/// Coupon management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/coupons.html")]
pub struct CouponsTemplate {
    pub page: PageContext,
    pub coupons: Vec<CouponView>,
    pub today: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display marketplace counters.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<DashboardTemplate, AppError> {
    let stats = fetched(
        state.backend().admin_stats(&current.token).await,
        &session,
        &mut page,
        "marketplace statistics",
    )
    .await?;

    Ok(DashboardTemplate {
        page,
        stats: AdminStatsView::from(&stats),
    })
}

/// Display every product in the marketplace.
#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<ProductsTemplate, AppError> {
    let products = fetched(
        state.backend().admin_products(&current.token).await,
        &session,
        &mut page,
        "products",
    )
    .await?;

    Ok(ProductsTemplate {
        page,
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Display shopper accounts.
#[instrument(skip_all)]
pub async fn users(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<AccountsTemplate, AppError> {
    let accounts = fetched(
        state.backend().admin_users(&current.token).await,
        &session,
        &mut page,
        "users",
    )
    .await?;

    Ok(AccountsTemplate {
        page,
        heading: "Users",
        sellers: false,
        accounts: accounts.iter().map(AccountView::from).collect(),
    })
}

/// Display seller accounts.
#[instrument(skip_all)]
pub async fn sellers(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<AccountsTemplate, AppError> {
    let accounts = fetched(
        state.backend().admin_sellers(&current.token).await,
        &session,
        &mut page,
        "sellers",
    )
    .await?;

    Ok(AccountsTemplate {
        page,
        heading: "Sellers",
        sellers: true,
        accounts: accounts.iter().map(AccountView::from).collect(),
    })
}

/// Display the reviews left on one product.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn product_reviews(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
    Path(product_id): Path<ProductId>,
) -> Result<ReviewsTemplate, AppError> {
    let reviews = fetched(
        state
            .backend()
            .product_reviews(&current.token, &product_id)
            .await,
        &session,
        &mut page,
        "reviews",
    )
    .await?;

    Ok(ReviewsTemplate {
        page,
        product_id: product_id.to_string(),
        reviews: reviews.reviews.iter().map(ReviewView::from).collect(),
    })
}

/// Display coupons with the create form.
#[instrument(skip_all)]
pub async fn coupons(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<CouponsTemplate, AppError> {
    let coupons = fetched(
        state.backend().coupons(&current.token).await,
        &session,
        &mut page,
        "coupons",
    )
    .await?;

    let today = Utc::now().date_naive();
    Ok(CouponsTemplate {
        page,
        coupons: coupons.iter().map(|c| CouponView::new(c, today)).collect(),
        today: today.format("%Y-%m-%d").to_string(),
    })
}

/// Create a coupon.
#[instrument(skip_all)]
pub async fn create_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(form): Form<CouponForm>,
) -> Result<Response, AppError> {
    let toast = match form.parse(Utc::now().date_naive()) {
        Ok(coupon) => {
            let result = state.backend().create_coupon(&current.token, &coupon).await;
            if result.is_ok() {
                add_breadcrumb(
                    "coupons",
                    "Created coupon",
                    Some(&[("code", coupon.code.as_str())]),
                );
            }
            mutation_toast(
                result,
                &session,
                "Coupon created",
                "Failed to create coupon",
            )
            .await?
        }
        Err(message) => Toast::error(message),
    };
    set_flash(&session, &toast).await?;

    Ok(Redirect::to(COUPONS_PATH).into_response())
}

/// Delete a coupon.
#[instrument(skip_all, fields(coupon_id = %coupon_id))]
pub async fn delete_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Path(coupon_id): Path<CouponId>,
) -> Result<Response, AppError> {
    let result = state
        .backend()
        .delete_coupon(&current.token, &coupon_id)
        .await;
    let toast = mutation_toast(
        result,
        &session,
        "Coupon deleted",
        "Failed to delete coupon",
    )
    .await?;
    set_flash(&session, &toast).await?;

    Ok(Redirect::to(COUPONS_PATH).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn form() -> CouponForm {
        CouponForm {
            code: " diwali25 ".to_string(),
            discount: 25,
            expiry: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
        }
    }

    #[test]
    fn test_coupon_form_normalizes_code() {
        let coupon = form().parse(today()).unwrap();
        assert_eq!(coupon.code, "DIWALI25");
        assert_eq!(coupon.discount, 25);
    }

    #[test]
    fn test_coupon_form_rejects_invalid() {
        let bad_code = CouponForm {
            code: "no spaces".to_string(),
            ..form()
        };
        assert!(bad_code.parse(today()).is_err());

        let too_generous = CouponForm {
            discount: 95,
            ..form()
        };
        assert_eq!(
            too_generous.parse(today()).unwrap_err(),
            "Discount must be between 1 and 90 percent"
        );

        let expired = CouponForm {
            expiry: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            ..form()
        };
        assert_eq!(expired.parse(today()).unwrap_err(), "Expiry date is in the past");
    }

    #[test]
    fn test_coupon_view_expired_flag() {
        let coupon = Coupon {
            id: CouponId::new("c1"),
            code: "SUMMER".to_string(),
            discount: 10,
            expiry: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        };
        let view = CouponView::new(&coupon, today());
        assert!(view.expired);
        assert_eq!(view.expiry, "01 May 2025");
    }
}
