//! Disposition update service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::ports::{LeadDispositionCommand, LeadRepository, UpdateDispositionRequest};
use super::store_errors::map_lead_repository_error;
use super::{Error, HistoryEntry, Lead};

/// Records call outcomes and keeps the history trail in step.
pub struct LeadDispositionService<L> {
    leads: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L> LeadDispositionService<L> {
    /// Wire the service to the lead store.
    pub fn new(leads: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self { leads, clock }
    }
}

#[async_trait]
impl<L> LeadDispositionCommand for LeadDispositionService<L>
where
    L: LeadRepository,
{
    async fn update_disposition(&self, request: UpdateDispositionRequest) -> Result<Lead, Error> {
        let UpdateDispositionRequest {
            caller,
            lead_id,
            update,
        } = request;

        let mut lead = self
            .leads
            .find_by_id(lead_id)
            .await
            .map_err(map_lead_repository_error)?
            .ok_or_else(|| Error::not_found(format!("lead {lead_id} does not exist")))?;
        if caller.is_executive() && !lead.is_assigned_to(&caller.user_id) {
            return Err(Error::forbidden(format!(
                "lead {lead_id} is not assigned to {}",
                caller.user_id
            )));
        }

        let now = self.clock.utc();
        lead.record_disposition(&update, now);
        let entry = HistoryEntry::snapshot(&lead, &caller, now);
        self.leads
            .save_with_history(&lead, &entry)
            .await
            .map_err(map_lead_repository_error)?;

        info!(
            lead_id = %lead_id,
            disposition = %lead.disposition,
            updated_by = %caller.user_id,
            "disposition recorded"
        );
        Ok(lead)
    }
}
