use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_models::access::{authorize, Action, Actor, Decision, Resource};

use crate::models::{AppointmentError, BusySlot, MAX_HORIZON_DAYS};
use crate::services::store::AppointmentStore;

/// Turns a professional's upcoming appointments into the intervals a booking
/// calendar has to block out.
pub struct BusySlotService {
    store: Arc<dyn AppointmentStore>,
}

impl BusySlotService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn get_busy_slots_for(
        &self,
        actor: &Actor,
        professional_id: Uuid,
        from: DateTime<Utc>,
        horizon_days: u32,
    ) -> Result<Vec<BusySlot>, AppointmentError> {
        let resource = Resource::Availability { professional_id };
        if let Decision::Deny(reason) = authorize(actor, &resource, &Action::ReadBusySlots) {
            return Err(AppointmentError::Forbidden(reason));
        }

        self.get_busy_slots(professional_id, from, horizon_days).await
    }

    /// Slots for appointments starting in `[from, from + horizon_days)`.
    /// Cancelled appointments free their slot. Adjacent or overlapping slots
    /// are returned as-is, sorted by start.
    pub async fn get_busy_slots(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        horizon_days: u32,
    ) -> Result<Vec<BusySlot>, AppointmentError> {
        if !(1..=MAX_HORIZON_DAYS).contains(&horizon_days) {
            return Err(AppointmentError::ValidationError(format!(
                "horizon_days must be between 1 and {}",
                MAX_HORIZON_DAYS
            )));
        }

        let until = from
            .checked_add_signed(Duration::days(i64::from(horizon_days)))
            .ok_or_else(|| {
                AppointmentError::ValidationError("from is out of range".to_string())
            })?;
        debug!(
            "Computing busy slots for professional {} from {} until {}",
            professional_id, from, until
        );

        let appointments = self
            .store
            .list_in_window(professional_id, from, until)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut slots: Vec<BusySlot> = appointments
            .iter()
            .filter(|a| !a.status.is_cancellation())
            .filter(|a| a.date >= from && a.date < until)
            .map(|a| a.busy_slot())
            .collect();
        slots.sort_by_key(|slot| slot.start);

        Ok(slots)
    }
}
