//! Seller console route handlers.

pub mod catalog;
pub mod orders;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::types::{ChatThread, SellerStats};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireSession;
use crate::state::AppState;

use super::products::ReviewView;
use super::{Page, PageContext, display_datetime, fetched};

/// Seller dashboard counters for templates.
#[derive(Clone)]
pub struct SellerStatsView {
    pub products: u64,
    pub orders: u64,
    pub pending_items: u64,
    pub revenue: String,
}

impl From<&SellerStats> for SellerStatsView {
    fn from(stats: &SellerStats) -> Self {
        Self {
            products: stats.products,
            orders: stats.orders,
            pending_items: stats.pending_items,
            revenue: stats.revenue.to_string(),
        }
    }
}

/// Chat thread display data for templates.
#[derive(Clone)]
pub struct ChatView {
    pub participant: String,
    pub last_message: String,
    pub updated_at: String,
}

impl From<&ChatThread> for ChatView {
    fn from(thread: &ChatThread) -> Self {
        Self {
            participant: thread.participant.clone(),
            last_message: thread.last_message.clone(),
            updated_at: display_datetime(thread.updated_at),
        }
    }
}

/// Seller dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub stats: SellerStatsView,
}

/// Seller reviews template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/reviews.html")]
pub struct ReviewsTemplate {
    pub page: PageContext,
    pub reviews: Vec<ReviewView>,
}

/// Seller chats template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/chats.html")]
pub struct ChatsTemplate {
    pub page: PageContext,
    pub threads: Vec<ChatView>,
}

/// Display the seller dashboard.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<DashboardTemplate, AppError> {
    let stats = fetched(
        state.backend().seller_stats(&current.token).await,
        &session,
        &mut page,
        "store statistics",
    )
    .await?;

    Ok(DashboardTemplate {
        page,
        stats: SellerStatsView::from(&stats),
    })
}

/// Display reviews left on the seller's products.
#[instrument(skip_all)]
pub async fn reviews(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<ReviewsTemplate, AppError> {
    let reviews = fetched(
        state.backend().seller_reviews(&current.token).await,
        &session,
        &mut page,
        "reviews",
    )
    .await?;

    Ok(ReviewsTemplate {
        page,
        reviews: reviews.reviews.iter().map(ReviewView::from).collect(),
    })
}

/// Display the seller's chat threads, most recent first.
#[instrument(skip_all)]
pub async fn chats(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<ChatsTemplate, AppError> {
    let mut threads = fetched(
        state.backend().chats(&current.token).await,
        &session,
        &mut page,
        "chats",
    )
    .await?;
    threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    Ok(ChatsTemplate {
        page,
        threads: threads.iter().map(ChatView::from).collect(),
    })
}
