//! Order lifecycle.
//!
//! ```text
//! waiting -> validated -> paid -> preparation -> prepared -> delivery -> delivered
//!                 \__________________/                   \-> recovery -> recovered
//! ```
//!
//! `waiting -> validated` happens when an appointment is booked and is not an
//! admin transition. Payment confirmation arrives from the gateway and may
//! land on an order an admin already moved into preparation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Waiting,
    Validated,
    Paid,
    Preparation,
    Prepared,
    Delivery,
    Recovery,
    Delivered,
    Recovered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Waiting,
        OrderStatus::Validated,
        OrderStatus::Paid,
        OrderStatus::Preparation,
        OrderStatus::Prepared,
        OrderStatus::Delivery,
        OrderStatus::Recovery,
        OrderStatus::Delivered,
        OrderStatus::Recovered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Validated => "validated",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparation => "preparation",
            OrderStatus::Prepared => "prepared",
            OrderStatus::Delivery => "delivery",
            OrderStatus::Recovery => "recovery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Recovered => "recovered",
        }
    }

    /// Whether the order has been paid for or is past payment.
    pub fn is_settled(&self) -> bool {
        !matches!(self, OrderStatus::Waiting | OrderStatus::Validated)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// How the customer receives the order, taken from its appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfilment {
    Pickup,
    Delivery,
}

impl Fulfilment {
    pub fn from_is_retrait(is_retrait: bool) -> Self {
        if is_retrait {
            Fulfilment::Pickup
        } else {
            Fulfilment::Delivery
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// An administrator moves the order to the given status.
    Advance(OrderStatus),
    /// The payment gateway confirmed the checkout session.
    PaymentCompleted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionContext {
    pub fulfilment: Option<Fulfilment>,
}

impl TransitionContext {
    pub fn new(fulfilment: Option<Fulfilment>) -> Self {
        Self { fulfilment }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("orders in status `{0}` cannot be advanced")]
    InvalidCurrentStatus(OrderStatus),

    #[error("cannot move an order from `{from}` to `{to}`")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order has no appointment to choose between delivery and pickup")]
    MissingFulfilment,

    #[error("payment cannot be recorded for an order in status `{0}`")]
    PaymentNotExpected(OrderStatus),
}

/// The single status an administrator may move `current` to.
pub fn next_status(
    current: OrderStatus,
    context: TransitionContext,
) -> Result<OrderStatus, TransitionError> {
    match current {
        OrderStatus::Validated | OrderStatus::Paid => Ok(OrderStatus::Preparation),
        OrderStatus::Preparation => Ok(OrderStatus::Prepared),
        OrderStatus::Prepared => match context.fulfilment {
            Some(Fulfilment::Delivery) => Ok(OrderStatus::Delivery),
            Some(Fulfilment::Pickup) => Ok(OrderStatus::Recovery),
            None => Err(TransitionError::MissingFulfilment),
        },
        OrderStatus::Delivery => Ok(OrderStatus::Delivered),
        OrderStatus::Recovery => Ok(OrderStatus::Recovered),
        OrderStatus::Waiting | OrderStatus::Delivered | OrderStatus::Recovered => {
            Err(TransitionError::InvalidCurrentStatus(current))
        }
    }
}

pub fn transition(
    current: OrderStatus,
    event: OrderEvent,
    context: TransitionContext,
) -> Result<OrderStatus, TransitionError> {
    match event {
        OrderEvent::Advance(target) => {
            let allowed = next_status(current, context)?;
            if allowed != target {
                return Err(TransitionError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }
            Ok(allowed)
        }
        // Redelivered webhooks and late confirmations keep the current status.
        OrderEvent::PaymentCompleted if current.is_settled() => Ok(current),
        OrderEvent::PaymentCompleted => match current {
            OrderStatus::Validated => Ok(OrderStatus::Paid),
            _ => Err(TransitionError::PaymentNotExpected(current)),
        },
    }
}
