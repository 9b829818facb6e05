use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/user", cart::router())
        .nest("/appointments", appointments::router())
        .nest("/orders", orders::router())
        .nest("/checkout", checkout::router())
        .nest("/webhooks", checkout::webhook_router())
        .nest("/admin", admin::router())
}
