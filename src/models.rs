use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        cart::{CartLineItem, LineProduct, pack_price},
        scheduling::format_time,
    },
    entity::{appointments, carts, categories, products, users},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthdate: Option<NaiveDate>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            birthdate: model.birthdate,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            parent_id: model.parent_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    /// Unit price in cents.
    pub price: i64,
    pub stock: i32,
    /// Pack price in cents: `price × stock`.
    pub total_price: i64,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            total_price: pack_price(model.price, model.stock),
            id: model.id,
            name: model.name,
            description: model.description,
            unit: model.unit,
            price: model.price,
            stock: model.stock,
            category_id: model.category_id,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&products::Model> for LineProduct {
    fn from(model: &products::Model) -> Self {
        Self {
            name: model.name.clone(),
            unit: model.unit.clone(),
            price: model.price,
            stock: model.stock,
        }
    }
}

/// A cart; once it leaves `waiting` it is an order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLineItem>,
    pub status: String,
    /// Total in cents.
    pub amount: i64,
    pub payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<carts::Model> for Cart {
    fn from(model: carts::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            items: model.items.0,
            status: model.status,
            amount: model.amount,
            payment_id: model.payment_id,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub date: NaiveDate,
    /// Slot start, `HH:mm`.
    pub time: String,
    pub is_retrait: bool,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl From<appointments::Model> for Appointment {
    fn from(model: appointments::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            cart_id: model.cart_id,
            date: model.date,
            time: format_time(model.time),
            is_retrait: model.is_retrait,
            address: model.address,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
