use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    domain::{
        cart::{self, CartLineItem, CartSummary, LineProduct},
        order_status::OrderStatus,
    },
    dto::{
        cart::{CartItemRequest, CartView, RemoveFromCartRequest},
        orders::OrderList,
    },
    entity::{
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, LineItems, Model as CartModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    response::{ApiResponse, PageMeta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    authorize(user, Capability::ActFor(owner_id))?;

    let txn = state.orm.begin().await?;
    let cart = find_waiting_cart(&txn, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("no open cart"))?;

    let items = stored_lines(&cart)?;
    let summary = summarize_lines(&txn, &items).await?;

    // Prices are live: an unpaid cart follows catalog changes.
    let cart = if summary.total != cart.amount {
        tracing::debug!(cart_id = %cart.id, old = cart.amount, new = summary.total, "cart amount refreshed");
        let mut active: CartActive = cart.into();
        active.amount = Set(summary.total);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        cart
    };
    txn.commit().await?;

    Ok(ApiResponse::ok("OK", cart_view(cart, summary)))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    authorize(user, Capability::ActFor(owner_id))?;
    if payload.quantity == 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;
    ensure_product_exists(&txn, payload.product_id).await?;

    let cart = match find_waiting_cart(&txn, owner_id).await? {
        Some(cart) => cart,
        None => open_cart(&txn, owner_id).await?,
    };
    let mut items = stored_lines(&cart)?;
    cart::add_line(&mut items, payload.product_id, payload.quantity)?;
    let (cart, summary) = persist_lines(&txn, cart, items).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartAdd,
        serde_json::json!({
            "cart_id": cart.id,
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::ok("Added to cart", cart_view(cart, summary)))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    authorize(user, Capability::ActFor(owner_id))?;
    if payload.quantity == 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;
    ensure_product_exists(&txn, payload.product_id).await?;

    let cart = find_waiting_cart(&txn, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("no open cart"))?;
    let mut items = stored_lines(&cart)?;
    cart::set_quantity(&mut items, payload.product_id, payload.quantity)?;
    let (cart, summary) = persist_lines(&txn, cart, items).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartUpdate,
        serde_json::json!({
            "cart_id": cart.id,
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::ok("Cart updated", cart_view(cart, summary)))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: RemoveFromCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    authorize(user, Capability::ActFor(owner_id))?;

    let txn = state.orm.begin().await?;
    let cart = find_waiting_cart(&txn, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("no open cart"))?;
    let mut items = stored_lines(&cart)?;
    cart::remove_line(&mut items, payload.product_id)?;
    let (cart, summary) = persist_lines(&txn, cart, items).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartRemove,
        serde_json::json!({ "cart_id": cart.id, "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::ok("Removed from cart", cart_view(cart, summary)))
}

/// Past and in-flight orders of a user, newest first by default.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Capability::ActFor(owner_id))?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all()
        .add(CartCol::UserId.eq(owner_id))
        .add(CartCol::Status.ne(OrderStatus::Waiting.as_str()));
    if let Some(status) = status_filter(query.status.as_deref())? {
        condition = condition.add(CartCol::Status.eq(status.as_str()));
    }

    let mut finder = Carts::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(CartCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(CartCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::page(
        "Ok",
        OrderList { items },
        PageMeta::new(page, limit, total),
    ))
}

pub(crate) fn status_filter(raw: Option<&str>) -> AppResult<Option<OrderStatus>> {
    let status = raw
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    Ok(status)
}

/// The user's open cart, locked for the rest of the transaction.
pub(crate) async fn find_waiting_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user_id))
                .add(CartCol::Status.eq(OrderStatus::Waiting.as_str())),
        )
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(cart)
}

/// Decodes stored lines, refusing rows that break the cart invariants.
pub(crate) fn stored_lines(cart: &CartModel) -> AppResult<Vec<CartLineItem>> {
    cart::validate_lines(&cart.items.0).map_err(|err| {
        AppError::Internal(anyhow::anyhow!("cart {} holds invalid lines: {err}", cart.id))
    })?;
    Ok(cart.items.0.clone())
}

/// Live product data for every product referenced by `items`.
pub(crate) async fn load_catalog<C: ConnectionTrait>(
    conn: &C,
    items: &[CartLineItem],
) -> AppResult<HashMap<Uuid, LineProduct>> {
    if items.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<Uuid> = items.iter().map(|line| line.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(products
        .iter()
        .map(|product| (product.id, LineProduct::from(product)))
        .collect())
}

pub(crate) async fn summarize_lines<C: ConnectionTrait>(
    conn: &C,
    items: &[CartLineItem],
) -> AppResult<CartSummary> {
    let catalog = load_catalog(conn, items).await?;
    let summary = cart::summarize(items, &catalog);
    if !summary.missing_products.is_empty() {
        tracing::warn!(
            missing = ?summary.missing_products,
            "cart references deleted products, they are left out of the total"
        );
    }
    Ok(summary)
}

pub(crate) fn cart_view(cart: CartModel, summary: CartSummary) -> CartView {
    CartView {
        cart: cart.into(),
        lines: summary.lines,
        missing_products: summary.missing_products,
    }
}

async fn ensure_product_exists<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<()> {
    let exists = Products::find_by_id(product_id).one(conn).await?.is_some();
    if !exists {
        return Err(AppError::not_found("product"));
    }
    Ok(())
}

async fn open_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        items: Set(LineItems::default()),
        status: Set(OrderStatus::Waiting.as_str().to_string()),
        amount: Set(0),
        payment_id: Set(None),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    tracing::debug!(cart_id = %cart.id, %user_id, "cart opened");
    Ok(cart)
}

async fn persist_lines<C: ConnectionTrait>(
    conn: &C,
    cart: CartModel,
    items: Vec<CartLineItem>,
) -> AppResult<(CartModel, CartSummary)> {
    cart::validate_lines(&items)?;
    let summary = summarize_lines(conn, &items).await?;

    let mut active: CartActive = cart.into();
    active.items = Set(LineItems(items));
    active.amount = Set(summary.total);
    active.updated_at = Set(Utc::now().into());
    let cart = active.update(conn).await?;
    Ok((cart, summary))
}
