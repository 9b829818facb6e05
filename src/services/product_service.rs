use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    domain::catalog,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    models::Product,
    response::{ApiResponse, Empty, PageMeta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::category_service,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::Validation(
                "min_price must not exceed max_price".into(),
            ));
        }
    }

    let mut condition = Condition::all();

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        let parents = category_service::load_parent_map(&state.orm).await?;
        if !parents.contains_key(&category_id) {
            return Err(AppError::not_found("category"));
        }
        condition = condition.add(Column::CategoryId.is_in(catalog::descendants(category_id, &parents)));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::page(
        "Products",
        ProductList { items },
        PageMeta::new(page, limit, total),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("product"))?;
    Ok(ApiResponse::ok("Product", product.into()))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Capability::ManageCatalog)?;
    payload.validate()?;
    ensure_name_free(&state.orm, &payload.name, None).await?;
    if let Some(category_id) = payload.category_id {
        ensure_category(&state.orm, category_id).await?;
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        unit: Set(payload.unit.as_str().to_string()),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category_id: Set(payload.category_id),
        image_url: Set(payload.image_url),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::ok("Product created", product.into()))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Capability::ManageCatalog)?;
    payload.validate()?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("product"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        ensure_name_free(&state.orm, &name, Some(id)).await?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(unit.as_str().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(&state.orm, category_id).await?;
        active.category_id = Set(Some(category_id));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::ok("Updated", product.into()))
}

/// Carts keep lines of deleted products; they are priced at zero from then on.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    authorize(user, Capability::ManageCatalog)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("product"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Deleted", Empty {}))
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all().add(Column::Name.eq(name.trim()));
    if let Some(id) = except {
        condition = condition.add(Column::Id.ne(id));
    }
    if Products::find().filter(condition).count(conn).await? > 0 {
        return Err(AppError::Conflict(format!(
            "a product named `{}` already exists",
            name.trim()
        )));
    }
    Ok(())
}

async fn ensure_category<C: ConnectionTrait>(conn: &C, category_id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(category_id).one(conn).await?.is_none() {
        return Err(AppError::Validation(format!(
            "category {category_id} does not exist"
        )));
    }
    Ok(())
}
