use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::appointment::AppointmentStatus;

use crate::models::{Appointment, AppointmentScope, StatusChange};

/// Persistence seam for appointments.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Newest first.
    async fn list_appointments(&self, scope: AppointmentScope) -> Result<Vec<Appointment>>;

    /// Applies `change` only while the row still has status `expected`.
    /// Returns `None` when another writer got there first.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: &StatusChange,
    ) -> Result<Option<Appointment>>;

    /// Appointments of the professional starting in `[from, until)`, any status.
    async fn list_in_window(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>>;
}

pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

// `+00:00` would be read back as a space inside a query string.
fn query_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        debug!("Fetching appointment: {}", id);

        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().next())
    }

    async fn list_appointments(&self, scope: AppointmentScope) -> Result<Vec<Appointment>> {
        let path = match scope {
            AppointmentScope::Patient(id) => {
                format!("/rest/v1/appointments?patient_id=eq.{}&order=date.desc", id)
            }
            AppointmentScope::Professional(id) => {
                format!("/rest/v1/appointments?professional_id=eq.{}&order=date.desc", id)
            }
            AppointmentScope::All => "/rest/v1/appointments?order=date.desc".to_string(),
        };

        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows)
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: &StatusChange,
    ) -> Result<Option<Appointment>> {
        debug!(
            "Updating appointment {} from {} to {}",
            id, expected, change.status
        );

        let mut body = json!({
            "status": change.status,
            "updated_at": Utc::now(),
        });
        if let Some(canceled_at) = change.canceled_at {
            body["canceled_at"] = json!(canceled_at);
        }
        if let Some(reason) = &change.cancel_reason {
            body["cancel_reason"] = json!(reason);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", id, expected);
        let rows = self
            .supabase
            .write_returning(Method::PATCH, &path, body)
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn list_in_window(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&date=gte.{}&date=lt.{}&order=date.asc",
            professional_id,
            query_timestamp(from),
            query_timestamp(until)
        );
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows)
    }
}
