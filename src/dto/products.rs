use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductUnit {
    Piece,
    Kg,
    G,
    L,
    Cl,
    Pack,
}

impl ProductUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductUnit::Piece => "piece",
            ProductUnit::Kg => "kg",
            ProductUnit::G => "g",
            ProductUnit::L => "l",
            ProductUnit::Cl => "cl",
            ProductUnit::Pack => "pack",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub unit: ProductUnit,
    /// Unit price in cents.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: i32,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<ProductUnit>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
