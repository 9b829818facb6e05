use std::collections::HashMap;

use chrono::{NaiveTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    domain::{
        order_status::OrderStatus,
        scheduling::{self, BookingError, SlotAllocator},
    },
    dto::appointments::{AppointmentCreated, AvailabilityQuery, AvailabilityResponse, CreateAppointmentRequest},
    entity::{
        appointments::{ActiveModel as AppointmentActive, Column as AppointmentCol, Entity as Appointments},
        carts::{ActiveModel as CartActive, Entity as Carts},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, authorize},
    notify::NotificationKind,
    services::{cart_service, notification_service},
    state::AppState,
};

pub fn allocator(state: &AppState) -> SlotAllocator {
    SlotAllocator::new(state.config.scheduling.clone())
}

/// Remaining capacity of every slot of a day.
pub async fn get_availability(
    state: &AppState,
    query: AvailabilityQuery,
) -> AppResult<AvailabilityResponse> {
    let date = scheduling::parse_date(&query.date)?;

    let booked: Vec<(NaiveTime, i64)> = Appointments::find()
        .select_only()
        .column(AppointmentCol::Time)
        .column_as(Expr::col(AppointmentCol::Id).count(), "booked")
        .filter(AppointmentCol::Date.eq(date))
        .group_by(AppointmentCol::Time)
        .into_tuple()
        .all(&state.orm)
        .await?;
    let bookings: HashMap<NaiveTime, u64> = booked
        .into_iter()
        .map(|(time, count)| (time, u64::try_from(count).unwrap_or(0)))
        .collect();

    Ok(AvailabilityResponse {
        available_slots: allocator(state).availability(&bookings),
    })
}

pub async fn create_appointment(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAppointmentRequest,
) -> AppResult<AppointmentCreated> {
    let allocator = allocator(state);
    let txn = state.orm.begin().await?;

    let cart = Carts::find_by_id(payload.cart_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("cart"))?;
    authorize(user, Capability::ActFor(cart.user_id))?;
    if payload.user_id != cart.user_id {
        return Err(AppError::Unauthorized(
            "cart does not belong to this user".into(),
        ));
    }

    let already_booked = Appointments::find()
        .filter(AppointmentCol::CartId.eq(cart.id))
        .count(&txn)
        .await?
        > 0;
    if already_booked {
        return Err(BookingError::AlreadyBooked.into());
    }

    if cart.status != OrderStatus::Waiting.as_str() {
        return Err(AppError::Conflict(format!(
            "cart is already `{}`",
            cart.status
        )));
    }
    let items = cart_service::stored_lines(&cart)?;
    if items.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }

    let today = allocator.store_today(Utc::now());
    let (date, time) = allocator.validate_slot(today, &payload.date, &payload.time)?;

    let address = if payload.is_retrait {
        allocator.config().store_address.clone()
    } else {
        payload
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .ok_or(BookingError::MissingAddress)?
    };

    // Serializes concurrent bookings of the same slot until commit.
    txn.execute(Statement::from_sql_and_values(
        txn.get_database_backend(),
        "SELECT pg_advisory_xact_lock($1)",
        [scheduling::slot_lock_key(date, time).into()],
    ))
    .await?;
    let booked = Appointments::find()
        .filter(AppointmentCol::Date.eq(date))
        .filter(AppointmentCol::Time.eq(time))
        .count(&txn)
        .await?;
    allocator.ensure_capacity(date, time, booked)?;

    let appointment = AppointmentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(cart.user_id),
        cart_id: Set(cart.id),
        date: Set(date),
        time: Set(time),
        is_retrait: Set(payload.is_retrait),
        address: Set(address),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let summary = cart_service::summarize_lines(&txn, &items).await?;
    let mut active: CartActive = cart.into();
    active.status = Set(OrderStatus::Validated.as_str().to_string());
    active.amount = Set(summary.total);
    active.updated_at = Set(Utc::now().into());
    let cart = active.update(&txn).await?;

    let recipient = notification_service::recipient(&txn, cart.user_id).await?;
    txn.commit().await?;

    tracing::info!(
        cart_id = %cart.id,
        %date,
        time = %scheduling::format_time(time),
        is_retrait = appointment.is_retrait,
        "appointment booked"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::AppointmentCreate,
        serde_json::json!({
            "appointment_id": appointment.id,
            "cart_id": cart.id,
            "date": date,
            "time": scheduling::format_time(time),
        }),
    )
    .await;

    notification_service::deliver(
        state,
        recipient,
        NotificationKind::AppointmentConfirmed {
            cart_id: cart.id,
            date,
            time: scheduling::format_time(time),
            is_retrait: appointment.is_retrait,
            address: appointment.address.clone(),
            lines: summary.lines,
            total: summary.total,
        },
    )
    .await?;

    Ok(AppointmentCreated {
        success: true,
        appointment: appointment.into(),
    })
}
