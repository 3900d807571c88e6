//! Client for the marketplace backend API.
//!
//! # Architecture
//!
//! - The backend is the source of truth for accounts, catalog, carts, orders
//!   and reviews; the storefront keeps no local copy and never caches
//!   responses
//! - Every call is a JSON request/response pair over reqwest
//! - The shopper's token is forwarded as `Authorization: Bearer <token>`;
//!   an optional service key identifies the storefront itself
//!
//! # Example
//!
//! ```rust,ignore
//! use marketplace_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let orders = client.seller_orders(&token).await?;
//! ```

pub mod types;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use marketplace_core::{CartItemId, CouponId, ProductId};

use crate::config::BackendConfig;
use types::{
    Account, Ack, AddToCart, AdminStats, AuthResponse, Cart, ChatThread, Coupon, Identity,
    LoginRequest, MeResponse, NewCoupon, NewProduct, Order, PlaceOrder, Product, RegisterRequest,
    ReviewList, SellerStats, StatusUpdate,
};

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend returned an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("invalid endpoint {0}: {1}")]
    InvalidUrl(String, url::ParseError),
}

/// Backend API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the service key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?;
            value.set_sensitive(true);
            headers.insert("x-api-key", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // A trailing slash keeps the base path when joining relative endpoints.
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self { client, base_url })
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder, BackendError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(path.to_string(), e))?;

        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder, what: &str) -> Result<T, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => return Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(BackendError::NotFound(what.to_string())),
            s if !s.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(BackendError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(format!("{what}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, BackendError> {
        Self::send(self.request(Method::GET, path, token)?, path).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, BackendError> {
        Self::send(self.request(method, path, token)?.json(body), path).await
    }

    /// Send a mutation and require `success: true`.
    async fn mutate<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<(), BackendError> {
        let builder = self.request(method, path, Some(token))?;
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        let ack: Ack = Self::send(builder, path).await?;
        if ack.success {
            Ok(())
        } else {
            Err(BackendError::Rejected(
                ack.message.unwrap_or_else(|| "request was not accepted".to_string()),
            ))
        }
    }

    // =========================================================================
    // Health & Auth
    // =========================================================================

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the backend does not answer with a success status.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let response = self.request(Method::GET, "health", None)?.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Api {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for wrong credentials.
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<AuthResponse, BackendError> {
        self.send_json(Method::POST, "auth/login", None, request).await
    }

    /// Create an account and receive a token for it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` if the backend refuses the registration.
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<AuthResponse, BackendError> {
        self.send_json(Method::POST, "auth/register", None, request).await
    }

    /// Confirm the identity behind a token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if the token is expired or revoked.
    pub async fn current_identity(&self, token: &str) -> Result<Identity, BackendError> {
        let me: MeResponse = self.get("auth/me", Some(token)).await?;
        Ok(me.user)
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn logout(&self, token: &str) -> Result<(), BackendError> {
        self.mutate::<()>(Method::POST, "auth/logout", token, None).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, optionally filtered by category and capped.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn products(
        &self,
        token: &str,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, BackendError> {
        let mut builder = self.request(Method::GET, "product", Some(token))?;
        if let Some(category) = category {
            builder = builder.query(&[("category", category)]);
        }
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        Self::send(builder, "product").await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    pub async fn product(&self, token: &str, id: &ProductId) -> Result<Product, BackendError> {
        self.get(&format!("product/{id}"), Some(token)).await
    }

    // =========================================================================
    // Cart, Checkout & Orders
    // =========================================================================

    /// Fetch the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn cart(&self, token: &str) -> Result<Cart, BackendError> {
        self.get("cart", Some(token)).await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails or refuses the line.
    pub async fn add_to_cart(&self, token: &str, line: &AddToCart) -> Result<(), BackendError> {
        self.mutate(Method::POST, "cart", token, Some(line)).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn remove_from_cart(&self, token: &str, id: &CartItemId) -> Result<(), BackendError> {
        self.mutate::<()>(Method::DELETE, &format!("cart/{id}"), token, None)
            .await
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails or refuses the order.
    pub async fn place_order(&self, token: &str, order: &PlaceOrder) -> Result<(), BackendError> {
        self.mutate(Method::POST, "order", token, Some(order)).await
    }

    /// The shopper's order history.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn user_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.get("order", Some(token)).await
    }

    /// Orders containing the seller's products.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn seller_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.get("order/seller", Some(token)).await
    }

    /// Set the status of one order line.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the backend answers `success: false`.
    pub async fn update_order_status(&self, token: &str, update: &StatusUpdate) -> Result<(), BackendError> {
        self.mutate(Method::PUT, "order/status", token, Some(update)).await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// All reviews (home page testimonials).
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn all_reviews(&self, token: &str) -> Result<ReviewList, BackendError> {
        self.get("review", Some(token)).await
    }

    /// Reviews of one product.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn product_reviews(&self, token: &str, id: &ProductId) -> Result<ReviewList, BackendError> {
        self.get(&format!("review/product/{id}"), Some(token)).await
    }

    /// Reviews of the seller's products.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn seller_reviews(&self, token: &str) -> Result<ReviewList, BackendError> {
        self.get("review/seller", Some(token)).await
    }

    // =========================================================================
    // Seller
    // =========================================================================

    /// Seller dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn seller_stats(&self, token: &str) -> Result<SellerStats, BackendError> {
        self.get("seller/stats", Some(token)).await
    }

    /// The seller's own products.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn seller_products(&self, token: &str) -> Result<Vec<Product>, BackendError> {
        self.get("seller/product", Some(token)).await
    }

    /// Create a product in the seller's store.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails or refuses the product.
    pub async fn create_product(&self, token: &str, product: &NewProduct) -> Result<(), BackendError> {
        self.mutate(Method::POST, "seller/product", token, Some(product))
            .await
    }

    /// Delete one of the seller's products.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), BackendError> {
        self.mutate::<()>(Method::DELETE, &format!("seller/product/{id}"), token, None)
            .await
    }

    /// The seller's chat threads.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn chats(&self, token: &str) -> Result<Vec<ChatThread>, BackendError> {
        self.get("chat", Some(token)).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Admin dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn admin_stats(&self, token: &str) -> Result<AdminStats, BackendError> {
        self.get("admin/stats", Some(token)).await
    }

    /// Every product in the marketplace.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn admin_products(&self, token: &str) -> Result<Vec<Product>, BackendError> {
        self.get("admin/product", Some(token)).await
    }

    /// Every shopper account.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn admin_users(&self, token: &str) -> Result<Vec<Account>, BackendError> {
        self.get("admin/user", Some(token)).await
    }

    /// Every seller account.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn admin_sellers(&self, token: &str) -> Result<Vec<Account>, BackendError> {
        self.get("admin/seller", Some(token)).await
    }

    /// Every coupon.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn coupons(&self, token: &str) -> Result<Vec<Coupon>, BackendError> {
        self.get("admin/coupon", Some(token)).await
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails or refuses the coupon.
    pub async fn create_coupon(&self, token: &str, coupon: &NewCoupon) -> Result<(), BackendError> {
        self.mutate(Method::POST, "admin/coupon", token, Some(coupon))
            .await
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails.
    pub async fn delete_coupon(&self, token: &str, id: &CouponId) -> Result<(), BackendError> {
        self.mutate::<()>(Method::DELETE, &format!("admin/coupon/{id}"), token, None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            api_url: Url::parse(url).unwrap(),
            api_key: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = BackendClient::new(&config("http://localhost:5000/api")).unwrap();
        let request = client
            .request(Method::GET, "order/seller", Some("t"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:5000/api/order/seller");
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer t"
        );
    }

    #[test]
    fn test_leading_slash_is_relative_to_base() {
        let client = BackendClient::new(&config("http://localhost:5000/api/")).unwrap();
        let request = client
            .request(Method::GET, "/review", None)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:5000/api/review");
        assert!(request.headers().get("authorization").is_none());
    }
}
