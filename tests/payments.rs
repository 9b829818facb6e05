use std::collections::HashMap;

use chrono::NaiveDate;
use grocery_drive_api::{
    config::PaymentConfig,
    notify::{LogNotifier, Notification, NotificationKind, Notifier, Recipient},
    payments::{
        CheckoutLine, CheckoutSessionRequest, DisabledGateway, PaymentError, PaymentGateway,
        StripeGateway,
    },
};
use uuid::Uuid;

fn payment_config(secret_key: Option<&str>) -> PaymentConfig {
    PaymentConfig {
        secret_key: secret_key.map(str::to_string),
        webhook_secret: None,
        api_base: "https://api.stripe.com/".to_string(),
        success_url: "https://shop.example/success".to_string(),
        cancel_url: "https://shop.example/cancel".to_string(),
        currency: "eur".to_string(),
        webhook_tolerance_secs: 300,
    }
}

fn request() -> CheckoutSessionRequest {
    CheckoutSessionRequest {
        cart_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        customer_email: Some("client@example.com".to_string()),
        lines: vec![
            CheckoutLine {
                name: "Organic lemons".to_string(),
                unit_amount: 260,
                quantity: 2,
            },
            CheckoutLine {
                name: "Carrots".to_string(),
                unit_amount: 149,
                quantity: 1,
            },
        ],
    }
}

#[test]
fn stripe_needs_a_secret_key() {
    assert!(StripeGateway::from_config(&payment_config(None)).is_none());
    assert!(StripeGateway::from_config(&payment_config(Some("sk_test_1"))).is_some());
}

#[test]
fn session_form_carries_lines_and_metadata() {
    let gateway = StripeGateway::from_config(&payment_config(Some("sk_test_1"))).unwrap();
    let request = request();
    let form: HashMap<String, String> = gateway.session_form(&request).into_iter().collect();

    assert_eq!(form["mode"], "payment");
    assert_eq!(form["metadata[cart_id]"], request.cart_id.to_string());
    assert_eq!(form["metadata[user_id]"], request.user_id.to_string());
    assert_eq!(form["client_reference_id"], request.cart_id.to_string());
    assert_eq!(form["customer_email"], "client@example.com");
    assert_eq!(form["line_items[0][price_data][currency]"], "eur");
    assert_eq!(
        form["line_items[0][price_data][product_data][name]"],
        "Organic lemons"
    );
    assert_eq!(form["line_items[0][price_data][unit_amount]"], "260");
    assert_eq!(form["line_items[0][quantity]"], "2");
    assert_eq!(form["line_items[1][quantity]"], "1");
    assert!(!form.contains_key("line_items[2][quantity]"));
}

#[tokio::test]
async fn disabled_gateway_refuses_sessions() {
    let result = DisabledGateway.create_session(request()).await;
    assert!(matches!(result, Err(PaymentError::NotConfigured)));
}

#[tokio::test]
async fn log_notifier_accepts_every_kind() {
    let recipient = Recipient {
        user_id: Uuid::new_v4(),
        email: "client@example.com".to_string(),
        name: "Camille Client".to_string(),
    };
    let cart_id = Uuid::new_v4();
    let kinds = [
        NotificationKind::AppointmentConfirmed {
            cart_id,
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            time: "10:00".to_string(),
            is_retrait: true,
            address: "1 place du Marché, 75001 Paris".to_string(),
            lines: Vec::new(),
            total: 0,
        },
        NotificationKind::StatusChanged {
            cart_id,
            status: grocery_drive_api::domain::order_status::OrderStatus::Prepared,
        },
        NotificationKind::PaymentConfirmed {
            cart_id,
            payment_id: "cs_test_1".to_string(),
            lines: Vec::new(),
            total: 0,
        },
    ];
    for kind in kinds {
        let notification = Notification {
            recipient: recipient.clone(),
            kind,
        };
        assert!(LogNotifier.send(notification).await.is_ok());
    }
}
