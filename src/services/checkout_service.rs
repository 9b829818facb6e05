use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    domain::order_status::{OrderEvent, OrderStatus, TransitionContext, transition},
    dto::checkout::{CreateSessionRequest, SessionCreated, WebhookAck},
    entity::carts::{ActiveModel as CartActive, Entity as Carts},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    models::Cart,
    notify::NotificationKind,
    payments::{
        CheckoutLine, CheckoutSessionRequest,
        webhook::{self, PaymentEvent},
    },
    services::{cart_service, notification_service, order_service},
    state::AppState,
};

/// Opens a hosted checkout for a validated cart, priced from the live catalog.
pub async fn create_session(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSessionRequest,
) -> AppResult<SessionCreated> {
    authorize(user, Capability::ActFor(payload.user_id))?;
    if !payload.items.is_empty() {
        tracing::debug!(
            items = payload.items.len(),
            "client-side checkout items ignored, lines are rebuilt from the catalog"
        );
    }

    let cart = Carts::find_by_id(payload.cart_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("cart"))?;
    if cart.user_id != payload.user_id {
        return Err(AppError::Unauthorized(
            "cart does not belong to this user".into(),
        ));
    }
    if cart.status != OrderStatus::Validated.as_str() {
        return Err(AppError::Conflict(format!(
            "only validated carts can be paid, this one is `{}`",
            cart.status
        )));
    }

    let items = cart_service::stored_lines(&cart)?;
    let summary = cart_service::summarize_lines(&state.orm, &items).await?;
    if summary.lines.is_empty() {
        return Err(AppError::Validation("cart has nothing to pay for".into()));
    }
    let recipient = notification_service::recipient(&state.orm, cart.user_id).await?;

    let request = CheckoutSessionRequest {
        cart_id: cart.id,
        user_id: cart.user_id,
        customer_email: Some(recipient.email),
        lines: summary
            .lines
            .iter()
            .map(|line| CheckoutLine {
                name: line.name.clone(),
                unit_amount: line.pack_price,
                quantity: line.quantity,
            })
            .collect(),
    };
    let session = state.payments.create_session(request).await?;

    tracing::info!(cart_id = %cart.id, session_id = %session.id, "checkout session created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CheckoutSessionCreate,
        serde_json::json!({ "cart_id": cart.id, "session_id": session.id, "amount": summary.total }),
    )
    .await;

    Ok(SessionCreated {
        session_id: session.id,
        url: session.url,
    })
}

/// Verifies a gateway delivery and applies it.
pub async fn handle_webhook(
    state: &AppState,
    signature: Option<&str>,
    payload: &[u8],
) -> AppResult<WebhookAck> {
    let secret = state
        .config
        .payments
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("STRIPE_WEBHOOK_SECRET is not set")))?;
    let signature = signature.ok_or(webhook::WebhookError::MalformedHeader)?;
    webhook::verify_signature(
        payload,
        signature,
        secret,
        Utc::now().timestamp(),
        state.config.payments.webhook_tolerance_secs,
    )?;

    match webhook::parse_event(payload)? {
        PaymentEvent::CheckoutCompleted {
            event_id,
            session_id,
            cart_id,
            user_id,
        } => {
            tracing::info!(%event_id, %session_id, %cart_id, "checkout completed");
            on_payment_completed(state, cart_id, user_id, &session_id).await?;
        }
        PaymentEvent::Ignored { event_id, kind } => {
            tracing::debug!(%event_id, %kind, "webhook event ignored");
        }
    }

    Ok(WebhookAck { received: true })
}

/// Records a confirmed payment on the cart. Redelivered events are no-ops.
pub async fn on_payment_completed(
    state: &AppState,
    cart_id: Uuid,
    user_id: Uuid,
    session_id: &str,
) -> AppResult<Cart> {
    let txn = state.orm.begin().await?;
    let cart = order_service::lock_order(&txn, cart_id).await?;
    if cart.user_id != user_id {
        return Err(AppError::Validation(format!(
            "cart {cart_id} does not belong to user {user_id}"
        )));
    }

    let current = order_service::current_status(&cart)?;
    let next = transition(current, OrderEvent::PaymentCompleted, TransitionContext::default())?;
    if current.is_settled() {
        if let Some(recorded) = cart.payment_id.as_deref() {
            if recorded == session_id {
                tracing::debug!(%cart_id, %session_id, "payment already recorded");
            } else {
                tracing::warn!(
                    %cart_id,
                    recorded,
                    %session_id,
                    "cart already paid by another checkout session, keeping the first payment"
                );
            }
            txn.commit().await?;
            return Ok(cart.into());
        }
    }

    let items = cart_service::stored_lines(&cart)?;
    let summary = cart_service::summarize_lines(&txn, &items).await?;
    let mut active: CartActive = cart.into();
    active.status = Set(next.as_str().to_string());
    active.payment_id = Set(Some(session_id.to_string()));
    active.paid_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let cart = active.update(&txn).await?;
    let recipient = notification_service::recipient(&txn, cart.user_id).await?;
    txn.commit().await?;

    tracing::info!(%cart_id, from = %current, to = %next, "payment recorded");
    audit::record(
        &state.pool,
        Some(user_id),
        AuditAction::PaymentCompleted,
        serde_json::json!({ "cart_id": cart_id, "session_id": session_id, "status": next }),
    )
    .await;

    notification_service::deliver_best_effort(
        state,
        recipient,
        NotificationKind::PaymentConfirmed {
            cart_id,
            payment_id: session_id.to_string(),
            lines: summary.lines,
            total: summary.total,
        },
    )
    .await;

    Ok(cart.into())
}
