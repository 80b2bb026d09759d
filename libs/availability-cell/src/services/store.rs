use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityBlock, AvailabilityBlockInput, ProfessionalSummary};

/// Persistence seam for weekly availability.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Blocks ordered by `(day_of_week, start_time)`.
    async fn read_availability(&self, professional_id: Uuid) -> Result<Vec<AvailabilityBlock>>;

    /// Deletes every block of the professional and inserts `blocks` as one
    /// all-or-nothing unit.
    async fn replace_availability(
        &self,
        professional_id: Uuid,
        blocks: &[AvailabilityBlockInput],
    ) -> Result<Vec<AvailabilityBlock>>;

    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<ProfessionalSummary>>;
}

pub struct SupabaseAvailabilityStore {
    supabase: SupabaseClient,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn read_availability(&self, professional_id: Uuid) -> Result<Vec<AvailabilityBlock>> {
        debug!("Fetching availability for professional: {}", professional_id);

        let path = format!(
            "/rest/v1/availability_blocks?professional_id=eq.{}&order=day_of_week.asc,start_time.asc",
            professional_id
        );
        let rows: Vec<AvailabilityBlock> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows)
    }

    async fn replace_availability(
        &self,
        professional_id: Uuid,
        blocks: &[AvailabilityBlockInput],
    ) -> Result<Vec<AvailabilityBlock>> {
        debug!(
            "Replacing availability for professional {} with {} blocks",
            professional_id,
            blocks.len()
        );

        // A single RPC call is a single transaction: the delete and the
        // insert commit together or not at all.
        let args = json!({
            "p_professional_id": professional_id,
            "p_blocks": blocks,
        });

        let rows: Vec<AvailabilityBlock> = self.supabase.rpc("replace_availability", args).await?;
        Ok(rows)
    }

    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<ProfessionalSummary>> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}&select=id,name,is_approved",
            professional_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}
