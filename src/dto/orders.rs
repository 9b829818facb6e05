use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::cart::LineSummary,
    models::{Appointment, Cart},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub new_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdated {
    pub message: String,
    pub updated_cart: Cart,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Cart,
    pub lines: Vec<LineSummary>,
    pub missing_products: Vec<Uuid>,
    pub appointment: Option<Appointment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Cart>,
}
