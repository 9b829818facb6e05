use grocery_drive_api::domain::order_status::{
    Fulfilment, OrderEvent, OrderStatus, TransitionContext, TransitionError, next_status,
    transition,
};

fn pickup() -> TransitionContext {
    TransitionContext::new(Some(Fulfilment::Pickup))
}

fn delivery() -> TransitionContext {
    TransitionContext::new(Some(Fulfilment::Delivery))
}

#[test]
fn admin_chain_for_delivery_orders() {
    let mut status = OrderStatus::Paid;
    let expected = [
        OrderStatus::Preparation,
        OrderStatus::Prepared,
        OrderStatus::Delivery,
        OrderStatus::Delivered,
    ];
    for target in expected {
        status = transition(status, OrderEvent::Advance(target), delivery()).unwrap();
        assert_eq!(status, target);
    }
}

#[test]
fn prepared_pickup_orders_go_to_recovery() {
    assert_eq!(
        next_status(OrderStatus::Prepared, pickup()),
        Ok(OrderStatus::Recovery)
    );
    assert_eq!(
        transition(
            OrderStatus::Recovery,
            OrderEvent::Advance(OrderStatus::Recovered),
            pickup()
        ),
        Ok(OrderStatus::Recovered)
    );
}

#[test]
fn prepared_without_appointment_cannot_move() {
    assert_eq!(
        next_status(OrderStatus::Prepared, TransitionContext::default()),
        Err(TransitionError::MissingFulfilment)
    );
}

#[test]
fn validated_orders_may_enter_preparation() {
    assert_eq!(
        transition(
            OrderStatus::Validated,
            OrderEvent::Advance(OrderStatus::Preparation),
            delivery()
        ),
        Ok(OrderStatus::Preparation)
    );
}

#[test]
fn skipping_a_step_is_rejected() {
    assert_eq!(
        transition(
            OrderStatus::Paid,
            OrderEvent::Advance(OrderStatus::Delivered),
            delivery()
        ),
        Err(TransitionError::InvalidTransition {
            from: OrderStatus::Paid,
            to: OrderStatus::Delivered,
        })
    );
    assert!(matches!(
        transition(
            OrderStatus::Prepared,
            OrderEvent::Advance(OrderStatus::Delivery),
            pickup()
        ),
        Err(TransitionError::InvalidTransition { .. })
    ));
}

#[test]
fn terminal_and_open_statuses_have_no_next_step() {
    for status in [
        OrderStatus::Waiting,
        OrderStatus::Delivered,
        OrderStatus::Recovered,
    ] {
        assert_eq!(
            next_status(status, delivery()),
            Err(TransitionError::InvalidCurrentStatus(status))
        );
    }
}

#[test]
fn payment_confirmation_is_idempotent() {
    let ctx = TransitionContext::default();
    assert_eq!(
        transition(OrderStatus::Validated, OrderEvent::PaymentCompleted, ctx),
        Ok(OrderStatus::Paid)
    );
    assert_eq!(
        transition(OrderStatus::Paid, OrderEvent::PaymentCompleted, ctx),
        Ok(OrderStatus::Paid)
    );
    assert_eq!(
        transition(OrderStatus::Preparation, OrderEvent::PaymentCompleted, ctx),
        Ok(OrderStatus::Preparation)
    );
    assert_eq!(
        transition(OrderStatus::Waiting, OrderEvent::PaymentCompleted, ctx),
        Err(TransitionError::PaymentNotExpected(OrderStatus::Waiting))
    );
}

#[test]
fn statuses_round_trip_through_their_names() {
    for status in OrderStatus::ALL {
        assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }
    assert!("shipped".parse::<OrderStatus>().is_err());
    assert!("Paid".parse::<OrderStatus>().is_err());
}

#[test]
fn settled_orders_keep_their_status_on_late_payments() {
    assert!(!OrderStatus::Waiting.is_settled());
    assert!(!OrderStatus::Validated.is_settled());
    for status in OrderStatus::ALL.into_iter().filter(OrderStatus::is_settled) {
        assert_eq!(
            transition(status, OrderEvent::PaymentCompleted, TransitionContext::default()),
            Ok(status),
            "{status}"
        );
    }
}
