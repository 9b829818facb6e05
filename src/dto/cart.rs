use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::cart::LineSummary, models::Cart};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    pub product_id: Uuid,
    /// Accepted for compatibility; the whole line is removed.
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A cart with its lines priced from the live catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<LineSummary>,
    /// Products referenced by the cart that no longer exist.
    pub missing_products: Vec<Uuid>,
}
