use grocery_drive_api::payments::webhook::{
    PaymentEvent, WebhookError, parse_event, sign, verify_signature,
};
use uuid::Uuid;

const SECRET: &str = "whsec_test_secret";
const NOW: i64 = 1_700_000_000;

fn completed_event(cart_id: Uuid, user_id: Uuid, payment_status: &str) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_123",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_abc",
                "payment_status": payment_status,
                "metadata": {
                    "cart_id": cart_id.to_string(),
                    "user_id": user_id.to_string()
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

#[test]
fn valid_signature_is_accepted() {
    let payload = br#"{"id":"evt_1"}"#;
    let header = sign(payload, SECRET, NOW).unwrap();
    assert!(header.starts_with(&format!("t={NOW},v1=")));
    assert_eq!(verify_signature(payload, &header, SECRET, NOW + 10, 300), Ok(()));
}

#[test]
fn any_matching_v1_entry_is_enough() {
    let payload = b"{}";
    let good = sign(payload, SECRET, NOW).unwrap();
    let good_sig = good.split("v1=").nth(1).unwrap();
    let header = format!("t={NOW},v1={},v0=ignored,v1={good_sig}", "00".repeat(32));
    assert_eq!(verify_signature(payload, &header, SECRET, NOW, 300), Ok(()));
}

#[test]
fn tampered_payload_or_wrong_secret_fails() {
    let header = sign(b"original", SECRET, NOW).unwrap();
    assert_eq!(
        verify_signature(b"tampered", &header, SECRET, NOW, 300),
        Err(WebhookError::BadSignature)
    );
    assert_eq!(
        verify_signature(b"original", &header, "whsec_other", NOW, 300),
        Err(WebhookError::BadSignature)
    );
}

#[test]
fn old_deliveries_expire() {
    let header = sign(b"{}", SECRET, NOW).unwrap();
    assert_eq!(
        verify_signature(b"{}", &header, SECRET, NOW + 301, 300),
        Err(WebhookError::Expired)
    );
}

#[test]
fn extreme_timestamps_expire_instead_of_overflowing() {
    for t in [i64::MIN, i64::MAX] {
        let header = format!("t={t},v1={}", "00".repeat(32));
        assert_eq!(
            verify_signature(b"{}", &header, SECRET, NOW, 300),
            Err(WebhookError::Expired),
            "t={t}"
        );
    }
    let header = format!("t={},v1=00", i64::MIN);
    assert_eq!(
        verify_signature(b"{}", &header, SECRET, i64::MAX, 300),
        Err(WebhookError::Expired)
    );
}

#[test]
fn malformed_headers_are_rejected() {
    for header in ["", "v1=abcd", "t=notanumber,v1=abcd", "t=1700000000"] {
        assert_eq!(
            verify_signature(b"{}", header, SECRET, NOW, 300),
            Err(WebhookError::MalformedHeader),
            "header `{header}`"
        );
    }
}

#[test]
fn completed_checkout_carries_cart_and_user() {
    let cart_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let event = parse_event(&completed_event(cart_id, user_id, "paid")).unwrap();
    assert_eq!(
        event,
        PaymentEvent::CheckoutCompleted {
            event_id: "evt_123".into(),
            session_id: "cs_test_abc".into(),
            cart_id,
            user_id,
        }
    );
}

#[test]
fn unpaid_sessions_and_other_events_are_ignored() {
    let event = parse_event(&completed_event(Uuid::new_v4(), Uuid::new_v4(), "unpaid")).unwrap();
    assert!(matches!(event, PaymentEvent::Ignored { .. }));

    let other = br#"{"id":"evt_9","type":"customer.created","data":{"object":{}}}"#;
    assert_eq!(
        parse_event(other).unwrap(),
        PaymentEvent::Ignored {
            event_id: "evt_9".into(),
            kind: "customer.created".into()
        }
    );
}

#[test]
fn missing_metadata_is_a_malformed_event() {
    let payload = serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_1", "metadata": {} } }
    })
    .to_string();
    assert!(matches!(
        parse_event(payload.as_bytes()),
        Err(WebhookError::MalformedEvent(_))
    ));
    assert!(matches!(
        parse_event(b"not json"),
        Err(WebhookError::MalformedEvent(_))
    ));
}
