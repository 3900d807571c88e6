//! Seller product management handlers.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use marketplace_core::{Price, ProductId};

use crate::backend::types::NewProduct;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireSession, set_flash};
use crate::models::Toast;
use crate::routes::products::ProductView;
use crate::routes::{CATEGORIES, Page, PageContext, fetched, mutation_toast};
use crate::state::AppState;

const MANAGE_PATH: &str = "/manageproduct";
const ADD_PATH: &str = "/addproduct";

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/products.html")]
pub struct ProductsTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
}

/// New product form template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/add_product.html")]
pub struct AddProductTemplate {
    pub page: PageContext,
    pub categories: &'static [(&'static str, &'static str)],
}

/// New product form data.
///
/// Sizes and colors are comma-separated; image URLs one per line.
#[derive(Debug, Deserialize)]
pub struct NewProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
    #[serde(default)]
    pub sizes: String,
    #[serde(default)]
    pub colors: String,
    #[serde(default)]
    pub images: String,
}

impl NewProductForm {
    /// Validate the form into a backend request, or the message to show.
    fn parse(self) -> Result<NewProduct, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }

        if !CATEGORIES.iter().any(|(_, slug)| *slug == self.category) {
            return Err("Please choose a category".to_string());
        }

        let price = Decimal::from_str(self.price.trim())
            .ok()
            .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
            .ok_or_else(|| "Price must be a positive amount".to_string())?;

        let images = self
            .images
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match Url::parse(line) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
                _ => Err(format!("Invalid image URL: {line}")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            price: Price::new(price),
            stock: self.stock,
            sizes: split_list(&self.sizes),
            colors: split_list(&self.colors),
            images,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Display the seller's products.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Page(mut page): Page,
) -> Result<ProductsTemplate, AppError> {
    let products = fetched(
        state.backend().seller_products(&current.token).await,
        &session,
        &mut page,
        "your products",
    )
    .await?;

    Ok(ProductsTemplate {
        page,
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Delete one of the seller's products.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Path(product_id): Path<ProductId>,
) -> Result<Response, AppError> {
    let result = state
        .backend()
        .delete_product(&current.token, &product_id)
        .await;
    let toast = mutation_toast(
        result,
        &session,
        "Product deleted",
        "Failed to delete product",
    )
    .await?;
    set_flash(&session, &toast).await?;

    Ok(Redirect::to(MANAGE_PATH).into_response())
}

/// Display the new product form.
pub async fn new(Page(page): Page) -> AddProductTemplate {
    AddProductTemplate {
        page,
        categories: CATEGORIES,
    }
}

/// Create a product from the form.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(form): Form<NewProductForm>,
) -> Result<Response, AppError> {
    let product = match form.parse() {
        Ok(product) => product,
        Err(message) => {
            set_flash(&session, &Toast::error(message)).await?;
            return Ok(Redirect::to(ADD_PATH).into_response());
        }
    };

    let result = state.backend().create_product(&current.token, &product).await;
    let created = result.is_ok();
    let toast = mutation_toast(
        result,
        &session,
        "Product added",
        "Failed to add product",
    )
    .await?;
    set_flash(&session, &toast).await?;

    if created {
        add_breadcrumb(
            "catalog",
            "Added product",
            Some(&[("category", product.category.as_str())]),
        );
        Ok(Redirect::to(MANAGE_PATH).into_response())
    } else {
        Ok(Redirect::to(ADD_PATH).into_response())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> NewProductForm {
        NewProductForm {
            name: " Oxford Shirt ".to_string(),
            description: "Cotton".to_string(),
            category: "shirts".to_string(),
            price: "1499.00".to_string(),
            stock: 12,
            sizes: "S, M ,L,,".to_string(),
            colors: "White".to_string(),
            images: "https://cdn.example/shirt.jpg\n\n".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let product = form().parse().unwrap();
        assert_eq!(product.name, "Oxford Shirt");
        assert_eq!(product.sizes, ["S", "M", "L"]);
        assert_eq!(product.images, ["https://cdn.example/shirt.jpg"]);
        assert_eq!(product.price, Price::new(Decimal::new(149_900, 2)));
    }

    #[test]
    fn test_parse_rejects_bad_price() {
        for price in ["", "0", "-5", "abc"] {
            let form = NewProductForm {
                price: price.to_string(),
                ..form()
            };
            assert_eq!(form.parse().unwrap_err(), "Price must be a positive amount");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_category_and_bad_image() {
        let form_bad_category = NewProductForm {
            category: "gadgets".to_string(),
            ..form()
        };
        assert!(form_bad_category.parse().is_err());

        let form_bad_image = NewProductForm {
            images: "javascript:alert(1)".to_string(),
            ..form()
        };
        assert!(form_bad_image.parse().unwrap_err().starts_with("Invalid image URL"));
    }
}
