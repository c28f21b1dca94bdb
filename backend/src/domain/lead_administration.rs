//! Super-admin bulk operations on the lead store.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::ports::{LeadAdministrationCommand, LeadRepository};
use super::store_errors::map_lead_repository_error;
use super::{CallerContext, Error, LeadId};

fn require_super_admin(caller: &CallerContext, action: &str) -> Result<(), Error> {
    if caller.is_super_admin() {
        Ok(())
    } else {
        Err(Error::forbidden(format!("only super admins may {action}")))
    }
}

/// Bulk deletes and assignment resets, restricted to super admins.
pub struct LeadAdministrationService<L> {
    leads: Arc<L>,
}

impl<L> LeadAdministrationService<L> {
    /// Wrap the lead store the bulk operations run against.
    pub fn new(leads: Arc<L>) -> Self {
        Self { leads }
    }
}

#[async_trait]
impl<L> LeadAdministrationCommand for LeadAdministrationService<L>
where
    L: LeadRepository,
{
    async fn delete_leads(
        &self,
        caller: CallerContext,
        lead_ids: Vec<LeadId>,
    ) -> Result<u64, Error> {
        require_super_admin(&caller, "delete leads")?;
        if lead_ids.is_empty() {
            return Err(Error::invalid_request("at least one lead id is required")
                .with_details(json!({ "field": "leadIds", "code": "empty" })));
        }

        let unique: Vec<LeadId> = lead_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let deleted = self
            .leads
            .delete_all(&unique)
            .await
            .map_err(map_lead_repository_error)?;
        info!(requested = unique.len(), deleted, by = %caller.user_id, "leads deleted");
        Ok(deleted)
    }

    async fn clear_assignments(&self, caller: CallerContext) -> Result<u64, Error> {
        require_super_admin(&caller, "clear assignments")?;
        let cleared = self
            .leads
            .clear_assignments()
            .await
            .map_err(map_lead_repository_error)?;
        info!(cleared, by = %caller.user_id, "lead assignments cleared");
        Ok(cleared)
    }
}
