//! Driving port for administrative bulk operations.

use async_trait::async_trait;

use crate::domain::{CallerContext, Error, LeadId};

/// Super-admin-only bulk mutations. Both are all-or-nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadAdministrationCommand: Send + Sync {
    /// Delete the listed leads, returning how many existed.
    async fn delete_leads(&self, caller: CallerContext, lead_ids: Vec<LeadId>)
    -> Result<u64, Error>;

    /// Drop every executive assignment, returning how many leads changed.
    async fn clear_assignments(&self, caller: CallerContext) -> Result<u64, Error>;
}
