use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    entity::Users,
    error::{AppError, AppResult},
    notify::{Notification, NotificationKind, Recipient},
    state::AppState,
};

pub(crate) async fn recipient<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Recipient> {
    let user = Users::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Recipient {
        user_id: user.id,
        email: user.email,
        name: format!("{} {}", user.first_name, user.last_name),
    })
}

/// Sends and reports failures to the caller.
pub(crate) async fn deliver(
    state: &AppState,
    recipient: Recipient,
    kind: NotificationKind,
) -> AppResult<()> {
    state
        .notifier
        .send(Notification { recipient, kind })
        .await?;
    Ok(())
}

/// Sends without failing the surrounding operation.
pub(crate) async fn deliver_best_effort(
    state: &AppState,
    recipient: Recipient,
    kind: NotificationKind,
) {
    let name = kind.name();
    if let Err(err) = state
        .notifier
        .send(Notification { recipient, kind })
        .await
    {
        tracing::warn!(error = %err, kind = name, "notification failed");
    }
}
