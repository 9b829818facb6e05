use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use grocery_drive_api::{
    domain::{
        cart::CartError,
        catalog::CategoryError,
        order_status::{OrderStatus, TransitionError, UnknownStatus},
        scheduling::BookingError,
    },
    error::AppError,
    middleware::auth::{AuthUser, Capability, authorize},
    models::Role,
    payments::{PaymentError, webhook::WebhookError},
};
use uuid::Uuid;

async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn errors_render_as_error_objects() {
    let (status, body) = body_of(AppError::Validation("quantity must be at least 1".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "quantity must be at least 1" }));

    let (status, body) = body_of(AppError::not_found("cart")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found: cart");
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let (status, body) = body_of(AppError::Internal(anyhow::anyhow!("db password is hunter2"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
}

#[test]
fn booking_errors_map_to_bad_request() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
    let conflicts = [
        BookingError::AlreadyBooked,
        BookingError::SlotFull {
            date,
            time: "10:00".into(),
        },
    ];
    for err in conflicts {
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Conflict(_)));
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
    }

    let app: AppError = BookingError::InvalidFormat("9h".into()).into();
    assert!(matches!(app, AppError::Validation(_)));
    let app: AppError = BookingError::MissingAddress.into();
    assert_eq!(app.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn domain_errors_map_to_statuses() {
    let missing = Uuid::new_v4();
    assert_eq!(
        AppError::from(CartError::NotInCart(missing)).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::from(CartError::InvalidQuantity).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(TransitionError::InvalidCurrentStatus(OrderStatus::Delivered)).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(UnknownStatus("shipped".into())).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(CategoryError::TooDeep).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(WebhookError::BadSignature).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(PaymentError::NotConfigured).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn clients_may_only_act_for_themselves() {
    let me = Uuid::new_v4();
    let client = AuthUser {
        user_id: me,
        role: Role::Client,
    };
    assert!(authorize(&client, Capability::ActFor(me)).is_ok());

    let denied = [
        Capability::ActFor(Uuid::new_v4()),
        Capability::ManageOrders,
        Capability::ManageCatalog,
        Capability::ManageUsers,
    ];
    for capability in denied {
        let err = authorize(&client, capability).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}

#[test]
fn admins_hold_every_capability() {
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    for capability in [
        Capability::ActFor(Uuid::new_v4()),
        Capability::ManageOrders,
        Capability::ManageCatalog,
        Capability::ManageUsers,
    ] {
        assert!(authorize(&admin, capability).is_ok());
    }
}
