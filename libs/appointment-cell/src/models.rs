use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use notification_cell::models::{AppointmentSnapshot, DEFAULT_APPOINTMENT_MINUTES};
use shared_models::appointment::AppointmentStatus;
use shared_models::error::AppError;

pub const MAX_CANCEL_REASON_CHARS: usize = 500;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 366;

// ==============================================================================
// APPOINTMENT
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub date: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub cancel_reason: Option<String>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time
            .unwrap_or_else(|| self.date + Duration::minutes(DEFAULT_APPOINTMENT_MINUTES))
    }

    pub fn snapshot(&self) -> AppointmentSnapshot {
        AppointmentSnapshot {
            id: self.id,
            patient_id: self.patient_id,
            professional_id: self.professional_id,
            service_id: self.service_id,
            start: self.date,
            end: self.end_time,
            status: self.status,
            cancel_reason: self.cancel_reason.clone(),
        }
    }

    pub fn busy_slot(&self) -> BusySlot {
        BusySlot {
            start: self.date,
            end: self.effective_end(),
        }
    }
}

/// Fields written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub canceled_at: Option<DateTime<Utc>>,
    /// Outer `None` leaves the stored reason untouched.
    pub cancel_reason: Option<Option<String>>,
}

impl StatusChange {
    pub fn to(status: AppointmentStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            canceled_at: status.is_cancellation().then_some(now),
            cancel_reason: None,
        }
    }

    pub fn cancellation(reason: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: AppointmentStatus::Cancelled,
            canceled_at: Some(now),
            cancel_reason: Some(reason),
        }
    }
}

/// Trims the free-text reason and caps it at [`MAX_CANCEL_REASON_CHARS`]
/// characters. Blank reasons are dropped.
pub fn normalize_cancel_reason(reason: Option<String>) -> Option<String> {
    let reason = reason?;
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_CANCEL_REASON_CHARS).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentScope {
    Patient(Uuid),
    Professional(Uuid),
    All,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusySlotQuery {
    pub from: Option<DateTime<Utc>>,
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingCalendarQuery {
    pub horizon_days: Option<u32>,
}

// ==============================================================================
// BUSY SLOTS
// ==============================================================================

/// Half-open `[start, end)` interval during which a professional is booked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Appointment was modified concurrently")]
    ConcurrentModification,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::InvalidStatusTransition(status) => AppError::Conflict(format!(
                "Appointment cannot be modified in current status: {}",
                status
            )),
            AppointmentError::ConcurrentModification => AppError::Conflict(
                "Appointment was modified by another request, reload and retry".to_string(),
            ),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
