use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::checkout::{CreateSessionRequest, SessionCreated, WebhookAck},
    error::{AppResult, ErrorBody},
    middleware::auth::AuthUser,
    payments::webhook::SIGNATURE_HEADER,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(create_session))
}

pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

#[utoipa::path(
    post,
    path = "/api/checkout/session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Hosted checkout session", body = SessionCreated),
        (status = 400, description = "Cart is not ready for payment", body = ErrorBody),
        (status = 401, description = "Not the cart owner", body = ErrorBody),
        (status = 500, description = "Payment gateway failure", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<Json<SessionCreated>> {
    let resp = checkout_service::create_session(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, description = "Raw signed event", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")
    ),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Bad signature or payload", body = ErrorBody)
    ),
    tag = "Checkout"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let resp = checkout_service::handle_webhook(&state, signature, &body).await?;
    Ok(Json(resp))
}
