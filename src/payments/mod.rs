//! Hosted checkout gateway.

pub mod stripe;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PaymentConfig;

pub use self::stripe::StripeGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub name: String,
    /// Price of one line unit in cents.
    pub unit_amount: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub cart_id: Uuid,
    pub user_id: Uuid,
    pub customer_email: Option<String>,
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payments are not configured")]
    NotConfigured,

    #[error("payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("payment gateway unreachable")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Gateway used when no secret key is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_session(
        &self,
        _request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}

pub fn gateway_from_config(config: &PaymentConfig) -> Arc<dyn PaymentGateway> {
    match StripeGateway::from_config(config) {
        Some(gateway) => Arc::new(gateway),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY is not set, checkout is disabled");
            Arc::new(DisabledGateway)
        }
    }
}
