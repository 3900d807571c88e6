//! Integration test harness for the marketplace storefront.
//!
//! Each test spawns a [`StubBackend`] speaking the backend API's JSON and a
//! real storefront router (in-memory sessions, rate limiting off) on
//! ephemeral ports, then drives it over HTTP with a cookie-keeping client
//! that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! No database or external service is needed.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

mod stub;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use reqwest::{Client, Response, redirect};
use tower_sessions::MemoryStore;
use url::Url;

use marketplace_core::Role;
use marketplace_storefront::app;
use marketplace_storefront::config::{BackendConfig, StorefrontConfig};
use marketplace_storefront::state::AppState;

pub use stub::StubBackend;

/// Password the stub backend accepts for every account.
pub const PASSWORD: &str = "Str0ng-enough";

/// A running storefront wired to its own stub backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub backend: StubBackend,
}

impl TestApp {
    /// Start a stub backend and a storefront in front of it.
    pub async fn spawn() -> Self {
        Self::spawn_with_recheck(Duration::from_secs(300)).await
    }

    /// Like [`TestApp::spawn`], re-confirming identities after `recheck`.
    pub async fn spawn_with_recheck(recheck: Duration) -> Self {
        let backend = StubBackend::spawn().await;

        let config = StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            database_url: None,
            backend: BackendConfig {
                api_url: Url::parse(&backend.api_url()).expect("stub backend URL"),
                api_key: None,
                timeout_secs: 5,
            },
            identity_recheck: recheck,
            auth_rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config).expect("storefront state");
        let router = app::build(state, MemoryStore::default());

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("storefront server");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            addr,
            client,
            backend,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// GET as htmx would issue it.
    pub async fn get_htmx(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("htmx GET request")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Form POST as htmx would issue it.
    pub async fn post_htmx(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("htmx POST request")
    }

    /// Log in through the login form as an account with `role`.
    pub async fn login_as(&self, role: Role) -> Response {
        let email = format!("{role}@fabrique.test");
        self.post_form("/auth", &[("email", email.as_str()), ("password", PASSWORD)])
            .await
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
