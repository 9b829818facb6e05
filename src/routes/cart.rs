use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{CartItemRequest, CartView, RemoveFromCartRequest},
        orders::OrderList,
    },
    error::{AppResult, ErrorBody},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{user_id}/carts",
            get(get_cart)
                .post(add_to_cart)
                .patch(update_cart_item)
                .delete(remove_from_cart),
        )
        .route("/{user_id}/orders", get(list_user_orders))
}

#[utoipa::path(
    get,
    path = "/api/user/{user_id}/carts",
    params(("user_id" = Uuid, Path, description = "Cart owner")),
    responses(
        (status = 200, description = "Open cart priced from the live catalog", body = ApiResponse<CartView>),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "No open cart", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &user, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/{user_id}/carts",
    params(("user_id" = Uuid, Path, description = "Cart owner")),
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_item(&state, &user, user_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/user/{user_id}/carts",
    params(("user_id" = Uuid, Path, description = "Cart owner")),
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Quantity replaced", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity", body = ErrorBody),
        (status = 404, description = "Product not in cart", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::update_quantity(&state, &user, user_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/user/{user_id}/carts",
    params(("user_id" = Uuid, Path, description = "Cart owner")),
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartView>),
        (status = 404, description = "Product not in cart", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RemoveFromCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_item(&state, &user, user_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/{user_id}/orders",
    params(
        ("user_id" = Uuid, Path, description = "Order owner"),
        OrderListQuery
    ),
    responses(
        (status = 200, description = "Order history", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn list_user_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = cart_service::list_orders(&state, &user, user_id, query).await?;
    Ok(Json(resp))
}
