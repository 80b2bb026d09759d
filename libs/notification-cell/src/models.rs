use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::appointment::AppointmentStatus;

/// Used when an appointment has no recorded end time.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 60;

/// What the side channels need to know about an appointment after a change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentSnapshot {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub cancel_reason: Option<String>,
}

impl AppointmentSnapshot {
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end
            .unwrap_or_else(|| self.start + Duration::minutes(DEFAULT_APPOINTMENT_MINUTES))
    }

    /// Google accepts base32hex event ids; a simple-format UUID is a valid one.
    pub fn calendar_event_id(&self) -> String {
        self.id.simple().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContact {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfessionalCalendar {
    pub name: Option<String>,
    pub google_refresh_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("No contact details for patient {0}")]
    MissingContact(Uuid),

    #[error("Calendar provider error: {0}")]
    Calendar(String),

    #[error("Email provider error: {0}")]
    Email(String),
}

/// Human-readable line for the status-change email.
pub fn status_message(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "Your appointment request is pending confirmation.",
        AppointmentStatus::Confirmed => "Your appointment has been confirmed.",
        AppointmentStatus::Completed => "Your appointment has been marked as completed.",
        AppointmentStatus::NoShow => "Your appointment was marked as missed.",
        AppointmentStatus::CancelledByUser | AppointmentStatus::Cancelled => {
            "Your appointment has been cancelled."
        }
        AppointmentStatus::CancelledByPro => "Your appointment was cancelled by the professional.",
    }
}
