//! Line-item bookkeeping for a cart and the valuation of its lines.
//!
//! A line is valued with the product's *pack price* (unit price multiplied by
//! the product's stock quantity) times the line quantity, always from live
//! product data. Lines pointing at a product that no longer exists stay in the
//! cart but contribute nothing to the amount.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("product {0} is not in the cart")]
    NotInCart(Uuid),

    #[error("product {0} appears more than once in the cart")]
    DuplicateLine(Uuid),

    #[error("quantity for product {0} is too large")]
    QuantityOverflow(Uuid),
}

/// Live product data needed to price and describe a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProduct {
    pub name: String,
    pub unit: String,
    pub price: i64,
    pub stock: i32,
}

impl LineProduct {
    pub fn pack_price(&self) -> i64 {
        pack_price(self.price, self.stock)
    }
}

pub fn pack_price(price: i64, stock: i32) -> i64 {
    price.saturating_mul(i64::from(stock))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LineSummary {
    pub product_id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: u32,
    pub pack_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartSummary {
    pub lines: Vec<LineSummary>,
    pub missing_products: Vec<Uuid>,
    pub total: i64,
}

/// Adds `quantity` of a product, merging into an existing line.
pub fn add_line(
    items: &mut Vec<CartLineItem>,
    product_id: Uuid,
    quantity: u32,
) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }
    match items.iter_mut().find(|line| line.product_id == product_id) {
        Some(line) => {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow(product_id))?;
        }
        None => items.push(CartLineItem {
            product_id,
            quantity,
        }),
    }
    Ok(())
}

pub fn set_quantity(
    items: &mut [CartLineItem],
    product_id: Uuid,
    quantity: u32,
) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }
    let line = items
        .iter_mut()
        .find(|line| line.product_id == product_id)
        .ok_or(CartError::NotInCart(product_id))?;
    line.quantity = quantity;
    Ok(())
}

pub fn remove_line(items: &mut Vec<CartLineItem>, product_id: Uuid) -> Result<(), CartError> {
    let before = items.len();
    items.retain(|line| line.product_id != product_id);
    if items.len() == before {
        return Err(CartError::NotInCart(product_id));
    }
    Ok(())
}

/// Checks the invariants every stored cart must hold.
pub fn validate_lines(items: &[CartLineItem]) -> Result<(), CartError> {
    let mut seen = HashSet::with_capacity(items.len());
    for line in items {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if !seen.insert(line.product_id) {
            return Err(CartError::DuplicateLine(line.product_id));
        }
    }
    Ok(())
}

pub fn summarize(items: &[CartLineItem], catalog: &HashMap<Uuid, LineProduct>) -> CartSummary {
    let mut lines = Vec::with_capacity(items.len());
    let mut missing_products = Vec::new();
    let mut total = 0_i64;

    for item in items {
        let Some(product) = catalog.get(&item.product_id) else {
            missing_products.push(item.product_id);
            continue;
        };
        let pack_price = product.pack_price();
        let line_total = pack_price.saturating_mul(i64::from(item.quantity));
        total = total.saturating_add(line_total);
        lines.push(LineSummary {
            product_id: item.product_id,
            name: product.name.clone(),
            unit: product.unit.clone(),
            quantity: item.quantity,
            pack_price,
            line_total,
        });
    }

    CartSummary {
        lines,
        missing_products,
        total,
    }
}

pub fn compute_amount(items: &[CartLineItem], catalog: &HashMap<Uuid, LineProduct>) -> i64 {
    summarize(items, catalog).total
}
