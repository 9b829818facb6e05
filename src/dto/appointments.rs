use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{domain::scheduling::SlotAvailability, models::Appointment};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Day to inspect, `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available_slots: Vec<SlotAvailability>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub user_id: Uuid,
    pub cart_id: Uuid,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm`
    pub time: String,
    pub is_retrait: bool,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentCreated {
    pub success: bool,
    pub appointment: Appointment,
}
