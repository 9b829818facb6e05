mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use grocery_drive_api::{app::build_app, payments::webhook};
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    build_app(common::offline_state())
}

async fn call(request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn availability_rejects_malformed_dates() {
    let request = Request::get("/api/appointments?date=2024-13-45")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "date must be formatted as YYYY-MM-DD, got `2024-13-45`"
    );
}

#[tokio::test]
async fn cart_requires_a_bearer_token() {
    let uri = format!("/api/user/{}/carts", Uuid::new_v4());
    let (status, body) = call(Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Authorization"));

    let request = Request::get(&uri)
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_updates_require_a_token() {
    let request = Request::patch(format!("/api/orders/{}/status", Uuid::new_v4()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"newStatus":"preparation"}"#))
        .unwrap();
    let (status, _) = call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inverted_price_range_is_rejected() {
    let request = Request::get("/api/products?min_price=500&max_price=100")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "min_price must not exceed max_price");
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{}}}"#;
    let forged = webhook::sign(payload.as_bytes(), "whsec_wrong", chrono::Utc::now().timestamp())
        .unwrap();
    let request = Request::post("/api/webhooks/stripe")
        .header(webhook::SIGNATURE_HEADER, forged)
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no signature matches the payload");

    let unsigned = Request::post("/api/webhooks/stripe")
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = call(unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ignored_webhook_events_are_acknowledged() {
    let payload = r#"{"id":"evt_2","type":"customer.created","data":{"object":{}}}"#;
    let signature = webhook::sign(
        payload.as_bytes(),
        common::WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
    )
    .unwrap();
    let request = Request::post("/api/webhooks/stripe")
        .header(webhook::SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = call(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "received": true }));
}

#[tokio::test]
async fn unknown_routes_get_an_error_body() {
    let (status, body) = call(Request::get("/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found: /nope");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
