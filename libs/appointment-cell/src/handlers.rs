use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use availability_cell::services::AvailabilityService;
use shared_config::AppConfig;
use shared_models::access::Actor;
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, BookingCalendarQuery, BusySlotQuery, CancelAppointmentRequest,
    UpdateStatusRequest, DEFAULT_HORIZON_DAYS,
};
use crate::services::{AppointmentStatusService, BusySlotService};

#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<AppointmentStatusService>,
    pub busy_slots: Arc<BusySlotService>,
}

#[derive(Clone)]
pub struct BookingCalendarState {
    pub availability: Arc<AvailabilityService>,
    pub busy_slots: Arc<BusySlotService>,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;

    let appointments = state.appointments.list_for_actor(&actor).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    let actor = Actor::from_user(&user)?;

    let appointment = state
        .appointments
        .get_appointment(&actor, appointment_id)
        .await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;
    let next: AppointmentStatus = request
        .status
        .parse()
        .map_err(AppError::ValidationError)?;

    let appointment = state
        .appointments
        .update_status(&actor, appointment_id, next)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;

    let appointment = state
        .appointments
        .cancel(&actor, appointment_id, request.reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_busy_slots(
    State(state): State<AppointmentState>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<BusySlotQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;
    let from = query.from.unwrap_or_else(Utc::now);
    let horizon_days = query.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);

    let slots = state
        .busy_slots
        .get_busy_slots_for(&actor, professional_id, from, horizon_days)
        .await?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "from": from,
        "horizon_days": horizon_days,
        "busy_slots": slots,
    })))
}

// ==============================================================================
// PUBLIC BOOKING CALENDAR
// ==============================================================================

/// Weekly schedule plus busy slots of an approved professional. Bookable
/// slots are derived from the two by the client.
#[axum::debug_handler]
pub async fn get_booking_calendar(
    State(state): State<BookingCalendarState>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<BookingCalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let horizon_days = query.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);

    let (professional, blocks) = state
        .availability
        .get_public_schedule(professional_id)
        .await?;

    let from = Utc::now();
    let busy_slots = state
        .busy_slots
        .get_busy_slots(professional_id, from, horizon_days)
        .await?;

    Ok(Json(json!({
        "professional": {
            "id": professional.id,
            "name": professional.name,
        },
        "from": from,
        "horizon_days": horizon_days,
        "availability": blocks,
        "busy_slots": busy_slots,
    })))
}
