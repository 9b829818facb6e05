use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Actions that leave a row in `audit_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserRoleUpdate,
    UserDelete,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    CartAdd,
    CartUpdate,
    CartRemove,
    AppointmentCreate,
    OrderStatusUpdate,
    CheckoutSessionCreate,
    PaymentCompleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::UserRoleUpdate => "user_role_update",
            AuditAction::UserDelete => "user_delete",
            AuditAction::CategoryCreate => "category_create",
            AuditAction::CategoryUpdate => "category_update",
            AuditAction::CategoryDelete => "category_delete",
            AuditAction::ProductCreate => "product_create",
            AuditAction::ProductUpdate => "product_update",
            AuditAction::ProductDelete => "product_delete",
            AuditAction::CartAdd => "cart_add",
            AuditAction::CartUpdate => "cart_update",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::AppointmentCreate => "appointment_create",
            AuditAction::OrderStatusUpdate => "order_status_update",
            AuditAction::CheckoutSessionCreate => "checkout_session_create",
            AuditAction::PaymentCompleted => "payment_completed",
        }
    }

    /// Table the action touches; stored in the `resource` column.
    pub fn resource(&self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::UserRoleUpdate
            | AuditAction::UserDelete => "users",
            AuditAction::CategoryCreate
            | AuditAction::CategoryUpdate
            | AuditAction::CategoryDelete => "categories",
            AuditAction::ProductCreate
            | AuditAction::ProductUpdate
            | AuditAction::ProductDelete => "products",
            AuditAction::AppointmentCreate => "appointments",
            AuditAction::CartAdd
            | AuditAction::CartUpdate
            | AuditAction::CartRemove
            | AuditAction::OrderStatusUpdate
            | AuditAction::CheckoutSessionCreate
            | AuditAction::PaymentCompleted => "carts",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: AuditAction,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit rows trail the committed change; a failed insert is logged, not returned.
pub async fn record(pool: &DbPool, actor: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(pool, actor, action, metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}
