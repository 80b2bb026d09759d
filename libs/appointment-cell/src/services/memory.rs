use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::appointment::AppointmentStatus;

use crate::models::{Appointment, AppointmentScope, StatusChange};
use crate::services::store::AppointmentStore;

/// Process-local store for tests and database-less runs. The status check and
/// the write happen under one lock, matching the filtered PATCH.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, appointment: Appointment) {
        if let Ok(mut appointments) = self.appointments.write() {
            appointments.insert(appointment.id, appointment);
        }
    }
}

fn newest_first(mut rows: Vec<Appointment>) -> Vec<Appointment> {
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let appointments = self
            .appointments
            .read()
            .map_err(|_| anyhow!("appointment store lock poisoned"))?;

        Ok(appointments.get(&id).cloned())
    }

    async fn list_appointments(&self, scope: AppointmentScope) -> Result<Vec<Appointment>> {
        let appointments = self
            .appointments
            .read()
            .map_err(|_| anyhow!("appointment store lock poisoned"))?;

        let rows = appointments
            .values()
            .filter(|a| match scope {
                AppointmentScope::Patient(id) => a.patient_id == id,
                AppointmentScope::Professional(id) => a.professional_id == id,
                AppointmentScope::All => true,
            })
            .cloned()
            .collect();

        Ok(newest_first(rows))
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: &StatusChange,
    ) -> Result<Option<Appointment>> {
        let mut appointments = self
            .appointments
            .write()
            .map_err(|_| anyhow!("appointment store lock poisoned"))?;

        let appointment = match appointments.get_mut(&id) {
            Some(a) if a.status == expected => a,
            _ => return Ok(None),
        };

        appointment.status = change.status;
        if let Some(canceled_at) = change.canceled_at {
            appointment.canceled_at = Some(canceled_at);
        }
        if let Some(reason) = &change.cancel_reason {
            appointment.cancel_reason = reason.clone();
        }
        appointment.updated_at = Utc::now();

        Ok(Some(appointment.clone()))
    }

    async fn list_in_window(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let appointments = self
            .appointments
            .read()
            .map_err(|_| anyhow!("appointment store lock poisoned"))?;

        let mut rows: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.professional_id == professional_id && a.date >= from && a.date < until)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);

        Ok(rows)
    }
}
