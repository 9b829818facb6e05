use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::users::{UpdateRoleRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    models::User,
    response::{ApiResponse, Empty, PageMeta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    authorize(user, Capability::ManageUsers)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::page(
        "Users",
        UserList { items },
        PageMeta::new(page, limit, total),
    ))
}

pub async fn update_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    authorize(user, Capability::ManageUsers)?;
    if id == user.user_id {
        return Err(AppError::Validation(
            "administrators cannot change their own role".into(),
        ));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    let mut active: ActiveModel = existing.into();
    active.role = Set(payload.role.as_str().to_string());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::UserRoleUpdate,
        serde_json::json!({ "user_id": id, "role": payload.role }),
    )
    .await;

    Ok(ApiResponse::ok("Role updated", updated.into()))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    authorize(user, Capability::ManageUsers)?;
    if id == user.user_id {
        return Err(AppError::Validation(
            "administrators cannot delete themselves".into(),
        ));
    }

    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("user"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::UserDelete,
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Deleted", Empty {}))
}
