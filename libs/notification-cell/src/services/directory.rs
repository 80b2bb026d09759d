use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use shared_database::supabase::SupabaseClient;

use crate::models::{PatientContact, ProfessionalCalendar};

/// Account lookups the notification side channels depend on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<PatientContact>>;

    async fn professional_calendar(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<ProfessionalCalendar>>;
}

pub struct SupabaseContactDirectory {
    supabase: SupabaseClient,
}

impl SupabaseContactDirectory {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ContactDirectory for SupabaseContactDirectory {
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<PatientContact>> {
        let path = format!("/rest/v1/users?id=eq.{}&select=email,name", patient_id);
        let rows: Vec<PatientContact> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn professional_calendar(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<ProfessionalCalendar>> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}&select=name,google_refresh_token",
            professional_id
        );
        let rows: Vec<ProfessionalCalendar> =
            self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }
}
