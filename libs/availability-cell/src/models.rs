use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

/// Recurring weekly window in which a professional accepts appointments.
/// `day_of_week` follows the 0 = Sunday convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityBlockInput {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityBlockInput {
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AvailabilityError::ValidationError(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        if self.start_time >= self.end_time {
            return Err(AvailabilityError::ValidationError(format!(
                "Start time {} must be before end time {}",
                self.start_time.format("%H:%M"),
                self.end_time.format("%H:%M")
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub blocks: Vec<AvailabilityBlockInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfessionalSummary {
    pub id: Uuid,
    pub name: String,
    pub is_approved: bool,
}

/// Canonical read order: day of week, then start time.
pub fn sort_blocks(blocks: &mut [AvailabilityBlock]) {
    blocks.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then(a.start_time.cmp(&b.start_time))
    });
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::ProfessionalNotFound => {
                AppError::NotFound("Professional not found".to_string())
            }
            AvailabilityError::Forbidden(msg) => AppError::Forbidden(msg),
            AvailabilityError::ValidationError(msg) => AppError::ValidationError(msg),
            AvailabilityError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
