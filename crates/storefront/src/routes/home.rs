//! Shopper home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireSession;
use crate::state::AppState;

use super::products::{ProductView, ReviewView};
use super::{Page, PageContext, fetched};

/// Products featured on the home page.
const FEATURED_LIMIT: u32 = 8;

/// Reviews shown under "Customer Rating".
const REVIEW_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductView>,
    pub reviews: Vec<ReviewView>,
}

/// Display the home page: featured products and recent customer reviews.
///
/// Each section degrades to its empty state on its own.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<HomeTemplate, AppError> {
    let backend = state.backend();
    let (products, reviews) = tokio::join!(
        backend.products(&current.token, None, Some(FEATURED_LIMIT)),
        backend.all_reviews(&current.token),
    );

    let products = fetched(products, &session, &mut page, "products").await?;
    let reviews = fetched(reviews, &session, &mut page, "reviews").await?;

    Ok(HomeTemplate {
        page,
        featured: products.iter().map(ProductView::from).collect(),
        reviews: reviews
            .reviews
            .iter()
            .take(REVIEW_LIMIT)
            .map(ReviewView::from)
            .collect(),
    })
}
