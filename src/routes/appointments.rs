use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::appointments::{
        AppointmentCreated, AvailabilityQuery, AvailabilityResponse, CreateAppointmentRequest,
    },
    error::{AppResult, ErrorBody},
    middleware::auth::AuthUser,
    services::appointment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(availability).post(create_appointment))
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Remaining capacity per slot", body = AvailabilityResponse),
        (status = 400, description = "Malformed date", body = ErrorBody)
    ),
    tag = "Appointments"
)]
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    let resp = appointment_service::get_availability(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked, cart validated", body = AppointmentCreated),
        (status = 400, description = "Slot rejected or already booked", body = ErrorBody),
        (status = 401, description = "Not the cart owner", body = ErrorBody),
        (status = 404, description = "Cart not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<AppointmentCreated>)> {
    let resp = appointment_service::create_appointment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
