use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    domain::order_status::{Fulfilment, OrderEvent, OrderStatus, TransitionContext, transition},
    dto::orders::{OrderDetail, OrderList, StatusUpdated, UpdateStatusRequest},
    entity::{
        appointments::{Column as AppointmentCol, Entity as Appointments, Model as AppointmentModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    notify::NotificationKind,
    response::{ApiResponse, PageMeta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, notification_service},
    state::AppState,
};

/// Every order across users; open carts are not orders yet and are left out.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Capability::ManageOrders)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(CartCol::Status.ne(OrderStatus::Waiting.as_str()));
    if let Some(status) = cart_service::status_filter(query.status.as_deref())? {
        condition = condition.add(CartCol::Status.eq(status.as_str()));
    }

    let mut finder = Carts::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(CartCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(CartCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::page(
        "Orders",
        OrderList { items: orders },
        PageMeta::new(page, limit, total),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Carts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("order"))?;
    authorize(user, Capability::ActFor(order.user_id))?;

    let appointment = find_appointment(&state.orm, order.id).await?;
    let items = cart_service::stored_lines(&order)?;
    let summary = cart_service::summarize_lines(&state.orm, &items).await?;

    let data = OrderDetail {
        order: order.into(),
        lines: summary.lines,
        missing_products: summary.missing_products,
        appointment: appointment.map(Into::into),
    };
    Ok(ApiResponse::ok("Order found", data))
}

/// Moves an order one step along the fulfilment chain.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateStatusRequest,
) -> AppResult<StatusUpdated> {
    authorize(user, Capability::ManageOrders)?;
    let target: OrderStatus = payload.new_status.trim().parse()?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    let current = current_status(&order)?;
    let appointment = find_appointment(&txn, order.id).await?;
    let context = TransitionContext::new(
        appointment
            .as_ref()
            .map(|a| Fulfilment::from_is_retrait(a.is_retrait)),
    );
    let next = transition(current, OrderEvent::Advance(target), context)?;

    let mut active: CartActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    let recipient = notification_service::recipient(&txn, order.user_id).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %current, to = %next, "order status updated");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::OrderStatusUpdate,
        serde_json::json!({ "order_id": order.id, "from": current, "to": next }),
    )
    .await;

    notification_service::deliver_best_effort(
        state,
        recipient,
        NotificationKind::StatusChanged {
            cart_id: order.id,
            status: next,
        },
    )
    .await;

    Ok(StatusUpdated {
        message: format!("Order status updated to {next}"),
        updated_cart: order.into(),
    })
}

pub(crate) async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<CartModel> {
    Carts::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("order"))
}

/// Stored status; a value outside the lifecycle cannot move anywhere.
pub(crate) fn current_status(order: &CartModel) -> AppResult<OrderStatus> {
    order.status.parse::<OrderStatus>().map_err(|_| {
        AppError::Conflict(format!("orders in status `{}` cannot be advanced", order.status))
    })
}

pub(crate) async fn find_appointment<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Option<AppointmentModel>> {
    let appointment = Appointments::find()
        .filter(AppointmentCol::CartId.eq(cart_id))
        .one(conn)
        .await?;
    Ok(appointment)
}
