use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    domain::catalog::{self, CategoryRef, ParentMap},
    dto::categories::{CategoryTree, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel, Column, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    models::Category,
    response::{ApiResponse, Empty},
    state::AppState,
};

pub async fn list_tree(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let categories = load_refs(&state.orm).await?;
    Ok(ApiResponse::ok(
        "Categories",
        CategoryTree {
            items: catalog::build_tree(&categories),
        },
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    authorize(user, Capability::ManageCatalog)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let parents = load_parent_map(&txn).await?;
    catalog::check_placement(None, payload.parent_id, &parents)?;

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        parent_id: Set(payload.parent_id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CategoryCreate,
        serde_json::json!({ "category_id": category.id, "parent_id": category.parent_id }),
    )
    .await;

    Ok(ApiResponse::ok("Category created", category.into()))
}

/// Renames and/or moves a category together with its subtree.
pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    authorize(user, Capability::ManageCatalog)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let existing = Categories::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("category"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(parent_id) = payload.parent_id {
        let parents = load_parent_map(&txn).await?;
        catalog::check_placement(Some(id), parent_id, &parents)?;
        active.parent_id = Set(parent_id);
    }
    let category = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CategoryUpdate,
        serde_json::json!({ "category_id": category.id, "parent_id": category.parent_id }),
    )
    .await;

    Ok(ApiResponse::ok("Updated", category.into()))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    authorize(user, Capability::ManageCatalog)?;

    let txn = state.orm.begin().await?;
    if Categories::find_by_id(id).one(&txn).await?.is_none() {
        return Err(AppError::not_found("category"));
    }
    let children = Categories::find()
        .filter(Column::ParentId.eq(id))
        .count(&txn)
        .await?;
    if children > 0 {
        return Err(AppError::Conflict(
            "category still has sub-categories".into(),
        ));
    }
    let products = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&txn)
        .await?;
    if products > 0 {
        return Err(AppError::Conflict("category still has products".into()));
    }
    Categories::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CategoryDelete,
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Deleted", Empty {}))
}

async fn load_refs<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<CategoryRef>> {
    let categories = Categories::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|c| CategoryRef {
            id: c.id,
            name: c.name,
            parent_id: c.parent_id,
        })
        .collect();
    Ok(categories)
}

pub(crate) async fn load_parent_map<C: ConnectionTrait>(conn: &C) -> AppResult<ParentMap> {
    Ok(catalog::parent_map(&load_refs(conn).await?))
}
