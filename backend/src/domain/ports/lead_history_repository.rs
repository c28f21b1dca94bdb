//! Port for the append-only lead history log.

use async_trait::async_trait;

use crate::domain::{HistoryEntry, LeadId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by lead history adapters.
    pub enum LeadHistoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "lead history connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "lead history query failed: {message}",
    }
}

/// Read side of the append-only [`HistoryEntry`] log.
///
/// Entries are appended by [`LeadRepository`](super::LeadRepository) writes
/// and are never updated or removed, including when their lead is deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadHistoryRepository: Send + Sync {
    /// Entries of one lead in write order.
    async fn list_for_lead(
        &self,
        lead_id: LeadId,
    ) -> Result<Vec<HistoryEntry>, LeadHistoryRepositoryError>;

    /// Entries of several leads in write order, fetched in one round trip.
    async fn list_for_leads(
        &self,
        lead_ids: &[LeadId],
    ) -> Result<Vec<HistoryEntry>, LeadHistoryRepositoryError>;
}
