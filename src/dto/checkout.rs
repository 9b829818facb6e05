use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Line as displayed by the storefront; prices are always re-read server-side.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub user_id: Uuid,
    pub cart_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
