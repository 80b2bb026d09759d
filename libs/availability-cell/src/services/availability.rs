use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::access::{authorize, Action, Actor, Decision, Resource};

use crate::models::{
    sort_blocks, AvailabilityBlock, AvailabilityBlockInput, AvailabilityError, ProfessionalSummary,
};
use crate::services::store::AvailabilityStore;

pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    fn check_access(
        &self,
        actor: &Actor,
        professional_id: Uuid,
        action: Action,
    ) -> Result<(), AvailabilityError> {
        let resource = Resource::Availability { professional_id };
        match authorize(actor, &resource, &action) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    "Denied {:?} on availability of {} for actor {}",
                    action, professional_id, actor.id
                );
                Err(AvailabilityError::Forbidden(reason))
            }
        }
    }

    /// Weekly schedule of the calling professional, ordered by day then start.
    pub async fn get_availability(
        &self,
        actor: &Actor,
        professional_id: Uuid,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityError> {
        self.check_access(actor, professional_id, Action::ReadAvailability)?;

        let mut blocks = self
            .store
            .read_availability(professional_id)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;
        sort_blocks(&mut blocks);

        Ok(blocks)
    }

    /// Replaces the whole schedule. Callers submit the full desired set;
    /// an empty list clears it. Overlapping blocks are accepted.
    pub async fn set_availability(
        &self,
        actor: &Actor,
        professional_id: Uuid,
        blocks: Vec<AvailabilityBlockInput>,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityError> {
        self.check_access(actor, professional_id, Action::ReplaceAvailability)?;

        for block in &blocks {
            block.validate()?;
        }

        let mut stored = self
            .store
            .replace_availability(professional_id, &blocks)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;
        sort_blocks(&mut stored);

        info!(
            "Availability replaced for professional {} ({} blocks)",
            professional_id,
            stored.len()
        );
        Ok(stored)
    }

    /// Read-only schedule for the booking calendar. Only approved
    /// professionals are visible; anything else reads as not found.
    pub async fn get_public_schedule(
        &self,
        professional_id: Uuid,
    ) -> Result<(ProfessionalSummary, Vec<AvailabilityBlock>), AvailabilityError> {
        let professional = self
            .store
            .find_professional(professional_id)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?
            .filter(|p| p.is_approved)
            .ok_or(AvailabilityError::ProfessionalNotFound)?;

        debug!("Serving public schedule for professional {}", professional_id);

        let mut blocks = self
            .store
            .read_availability(professional_id)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;
        sort_blocks(&mut blocks);

        Ok((professional, blocks))
    }
}
