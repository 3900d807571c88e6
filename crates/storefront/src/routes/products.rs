//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::ProductId;

use crate::backend::types::{Product, Review};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireSession;
use crate::state::AppState;

use super::{CATEGORIES, Page, PageContext, fetched, found, not_found};

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub stock: u32,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            image: product.images.first().cloned(),
            images: product.images.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            in_stock: product.stock > 0,
            stock: product.stock,
        }
    }
}

/// Review display data for templates.
#[derive(Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub rating: u8,
    pub stars: String,
    pub review: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let filled = usize::from(review.rating.min(5));
        Self {
            user_name: review.user_name.clone(),
            rating: review.rating,
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
            review: review.review.clone(),
        }
    }
}

/// Catalog search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/products.html")]
pub struct ProductsTemplate {
    pub page: PageContext,
    pub heading: String,
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/product.html")]
pub struct ProductTemplate {
    pub page: PageContext,
    pub product: ProductView,
    pub reviews: Vec<ReviewView>,
}

/// Display the full catalog, or send a search to its category page.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, AppError> {
    if let Some(term) = query.q.as_deref().map(str::trim)
        && !term.is_empty()
    {
        let slug: String =
            url::form_urlencoded::byte_serialize(term.to_lowercase().as_bytes()).collect();
        return Ok(Redirect::to(&format!("/products/{slug}")).into_response());
    }

    let products = fetched(
        state.backend().products(&current.token, None, None).await,
        &session,
        &mut page,
        "products",
    )
    .await?;

    Ok(ProductsTemplate {
        page,
        heading: "All Products".to_string(),
        products: products.iter().map(ProductView::from).collect(),
    }
    .into_response())
}

/// Display the catalog filtered to one category.
#[instrument(skip_all, fields(category = %category))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
    Path(category): Path<String>,
) -> Result<ProductsTemplate, AppError> {
    let products = fetched(
        state
            .backend()
            .products(&current.token, Some(&category), None)
            .await,
        &session,
        &mut page,
        "products",
    )
    .await?;

    Ok(ProductsTemplate {
        page,
        heading: category_label(&category),
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Display one product with its reviews.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
    Path(product_id): Path<ProductId>,
) -> Result<Response, AppError> {
    let backend = state.backend();
    let (product, reviews) = tokio::join!(
        backend.product(&current.token, &product_id),
        backend.product_reviews(&current.token, &product_id),
    );

    let Some(product) = found(product, &session).await? else {
        return Ok(not_found().await);
    };
    let reviews = fetched(reviews, &session, &mut page, "reviews").await?;

    Ok(ProductTemplate {
        page,
        product: ProductView::from(&product),
        reviews: reviews.reviews.iter().map(ReviewView::from).collect(),
    }
    .into_response())
}

/// Heading for a category slug: the known label, else the slug itself.
fn category_label(slug: &str) -> String {
    CATEGORIES
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(slug))
        .map_or_else(|| slug.to_string(), |(label, _)| (*label).to_string())
}
