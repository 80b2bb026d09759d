use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{sort_blocks, AvailabilityBlock, AvailabilityBlockInput, ProfessionalSummary};
use crate::services::store::AvailabilityStore;

/// Process-local store for tests and database-less runs. The replace swaps
/// the whole vector under one write lock, so readers never observe a mix.
#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    blocks: RwLock<HashMap<Uuid, Vec<AvailabilityBlock>>>,
    professionals: RwLock<HashMap<Uuid, ProfessionalSummary>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_professional(&self, id: Uuid, name: &str, is_approved: bool) {
        if let Ok(mut professionals) = self.professionals.write() {
            professionals.insert(
                id,
                ProfessionalSummary {
                    id,
                    name: name.to_string(),
                    is_approved,
                },
            );
        }
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn read_availability(&self, professional_id: Uuid) -> Result<Vec<AvailabilityBlock>> {
        let blocks = self
            .blocks
            .read()
            .map_err(|_| anyhow!("availability store lock poisoned"))?;

        let mut result = blocks.get(&professional_id).cloned().unwrap_or_default();
        sort_blocks(&mut result);
        Ok(result)
    }

    async fn replace_availability(
        &self,
        professional_id: Uuid,
        inputs: &[AvailabilityBlockInput],
    ) -> Result<Vec<AvailabilityBlock>> {
        let mut replacement: Vec<AvailabilityBlock> = inputs
            .iter()
            .map(|input| AvailabilityBlock {
                id: Uuid::new_v4(),
                professional_id,
                day_of_week: input.day_of_week,
                start_time: input.start_time,
                end_time: input.end_time,
            })
            .collect();
        sort_blocks(&mut replacement);

        let mut blocks = self
            .blocks
            .write()
            .map_err(|_| anyhow!("availability store lock poisoned"))?;
        blocks.insert(professional_id, replacement.clone());

        Ok(replacement)
    }

    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<ProfessionalSummary>> {
        let professionals = self
            .professionals
            .read()
            .map_err(|_| anyhow!("availability store lock poisoned"))?;

        Ok(professionals.get(&professional_id).cloned())
    }
}
