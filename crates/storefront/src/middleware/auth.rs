//! Route guards and authentication extractors.
//!
//! [`require_role`] protects a role subtree and [`public_gate`] protects the
//! login view. Both settle the session through [`AuthService::resolve`] and
//! then apply the pure access decision from `marketplace_core`, on every
//! request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use marketplace_core::{GuardOutcome, PublicGateOutcome, RouteRequirement, authorize, gate_public};

use crate::error::{AppError, SessionEnded};
use crate::models::CurrentSession;
use crate::navigation::{AUTH_PATH, NOT_FOUND_PATH, home_for};
use crate::services::auth::{AuthService, SessionSnapshot};
use crate::state::AppState;

/// State for a guarded subtree.
#[derive(Clone)]
pub struct GuardState {
    pub app: AppState,
    pub requirement: RouteRequirement,
}

impl GuardState {
    #[must_use]
    pub const fn new(app: AppState, requirement: RouteRequirement) -> Self {
        Self { app, requirement }
    }
}

/// Response when a guard turns a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login view (for page requests).
    RedirectToLogin,
    /// Redirect to the not-found view (for page requests).
    RedirectToNotFound,
    /// Unauthorized response (for API and htmx requests).
    Unauthorized,
    /// Not found response (for API and htmx requests).
    NotFound,
}

impl AuthRejection {
    /// Pick the page or status variant for the request.
    fn for_request(headers: &HeaderMap, uri: &Uri, denied: bool) -> Self {
        match (wants_status(headers, uri), denied) {
            (false, false) => Self::RedirectToLogin,
            (false, true) => Self::RedirectToNotFound,
            (true, false) => Self::Unauthorized,
            (true, true) => Self::NotFound,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(AUTH_PATH).into_response(),
            Self::RedirectToNotFound => Redirect::to(NOT_FOUND_PATH).into_response(),
            // htmx follows HX-Redirect with a full navigation
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [("HX-Redirect", HeaderValue::from_static(AUTH_PATH))],
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                [("HX-Redirect", HeaderValue::from_static(NOT_FOUND_PATH))],
            )
                .into_response(),
        }
    }
}

/// Whether the caller expects a status code instead of a redirect.
fn wants_status(headers: &HeaderMap, uri: &Uri) -> bool {
    uri.path().starts_with("/api/")
        || headers
            .get("hx-request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

async fn resolve(app: &AppState, session: &Session) -> Result<SessionSnapshot, AppError> {
    let service = AuthService::new(app.backend(), app.config().identity_recheck);
    Ok(service.resolve(session).await?)
}

/// Guard for a role subtree.
///
/// Apply with `route_layer` so unmatched paths still reach the fallback.
pub async fn require_role(
    State(guard): State<GuardState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let snapshot = match resolve(&guard.app, &session).await {
        Ok(snapshot) => snapshot,
        Err(e) => return e.into_response(),
    };

    match authorize(snapshot.state, guard.requirement) {
        GuardOutcome::Render(role) => {
            let Some(current) = snapshot.current else {
                return AppError::Internal(format!("authenticated {role} session without identity"))
                    .into_response();
            };
            // Handlers that see a backend 401 end the session mid-request.
            let expired = AuthRejection::for_request(request.headers(), request.uri(), false);
            request.extensions_mut().insert(current);
            let response = next.run(request).await;
            if response.extensions().get::<SessionEnded>().is_some() {
                return expired.into_response();
            }
            response
        }
        GuardOutcome::Denied => {
            tracing::debug!(path = %request.uri().path(), state = ?snapshot.state, "Role not admitted");
            AuthRejection::for_request(request.headers(), request.uri(), true).into_response()
        }
        // `resolve` never returns an unresolved state; treat it as logged out.
        GuardOutcome::RedirectToAuth | GuardOutcome::Pending => {
            AuthRejection::for_request(request.headers(), request.uri(), false).into_response()
        }
    }
}

/// Gate for the login view: authenticated sessions go to their home.
pub async fn public_gate(
    State(app): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let snapshot = match resolve(&app, &session).await {
        Ok(snapshot) => snapshot,
        Err(e) => return e.into_response(),
    };

    match gate_public(snapshot.state) {
        PublicGateOutcome::RedirectHome(role) => Redirect::to(home_for(role)).into_response(),
        PublicGateOutcome::RenderLogin | PublicGateOutcome::Pending => next.run(request).await,
    }
}

/// Extractor for the caller admitted by the route guard.
///
/// Only usable inside a guarded subtree.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(current): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", current.identity.name)
/// }
/// ```
pub struct RequireSession(pub CurrentSession);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AuthRejection::for_request(&parts.headers, &parts.uri, false))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(htmx: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if htmx {
            headers.insert("hx-request", HeaderValue::from_static("true"));
        }
        headers
    }

    #[test]
    fn test_page_requests_are_redirected() {
        let uri: Uri = "/store".parse().unwrap();
        assert_eq!(
            AuthRejection::for_request(&headers(false), &uri, false),
            AuthRejection::RedirectToLogin
        );
        assert_eq!(
            AuthRejection::for_request(&headers(false), &uri, true),
            AuthRejection::RedirectToNotFound
        );
    }

    #[test]
    fn test_htmx_and_api_requests_get_status() {
        let uri: Uri = "/orders/status".parse().unwrap();
        assert_eq!(
            AuthRejection::for_request(&headers(true), &uri, false),
            AuthRejection::Unauthorized
        );
        let api: Uri = "/api/orders".parse().unwrap();
        assert_eq!(
            AuthRejection::for_request(&headers(false), &api, true),
            AuthRejection::NotFound
        );
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), AUTH_PATH);

        let response = AuthRejection::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("hx-redirect").unwrap(), NOT_FOUND_PATH);
    }
}
