//! Customer notifications for appointment, status and payment events.
//!
//! Delivery (mail, SMS) lives outside this service; [`LogNotifier`] records
//! every notification as a structured log event.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{cart::LineSummary, order_status::OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    AppointmentConfirmed {
        cart_id: Uuid,
        date: NaiveDate,
        time: String,
        is_retrait: bool,
        address: String,
        lines: Vec<LineSummary>,
        total: i64,
    },
    StatusChanged {
        cart_id: Uuid,
        status: OrderStatus,
    },
    PaymentConfirmed {
        cart_id: Uuid,
        payment_id: String,
        lines: Vec<LineSummary>,
        total: i64,
    },
}

impl NotificationKind {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::AppointmentConfirmed { .. } => "appointment_confirmed",
            NotificationKind::StatusChanged { .. } => "status_changed",
            NotificationKind::PaymentConfirmed { .. } => "payment_confirmed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification rejected: {0}")]
    Rejected(String),

    #[error("notification transport failed")]
    Transport(#[from] anyhow::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let Notification { recipient, kind } = notification;
        match &kind {
            NotificationKind::AppointmentConfirmed {
                cart_id,
                date,
                time,
                is_retrait,
                total,
                lines,
                ..
            } => tracing::info!(
                kind = kind.name(),
                to = %recipient.email,
                %cart_id,
                %date,
                %time,
                is_retrait,
                lines = lines.len(),
                total,
                "notification sent"
            ),
            NotificationKind::StatusChanged { cart_id, status } => tracing::info!(
                kind = kind.name(),
                to = %recipient.email,
                %cart_id,
                %status,
                "notification sent"
            ),
            NotificationKind::PaymentConfirmed {
                cart_id,
                payment_id,
                total,
                lines,
            } => tracing::info!(
                kind = kind.name(),
                to = %recipient.email,
                %cart_id,
                %payment_id,
                lines = lines.len(),
                total,
                "notification sent"
            ),
        }
        Ok(())
    }
}
