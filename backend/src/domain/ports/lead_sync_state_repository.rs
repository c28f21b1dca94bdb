//! Port for lead-ads synchronisation bookkeeping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;
use super::lead_ads_source::LeadForm;

define_port_error! {
    /// Errors raised by sync state adapters.
    pub enum LeadSyncStateRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "sync state connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "sync state query failed: {message}",
    }
}

/// Watermark and form metadata of the lead-ads sync.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadSyncStateRepository: Send + Sync {
    /// Creation time of the newest submission already ingested.
    async fn last_fetched(&self) -> Result<Option<DateTime<Utc>>, LeadSyncStateRepositoryError>;

    async fn set_last_fetched(&self, at: DateTime<Utc>) -> Result<(), LeadSyncStateRepositoryError>;

    /// Insert or refresh form metadata.
    async fn upsert_forms(
        &self,
        forms: &[LeadForm],
        seen_at: DateTime<Utc>,
    ) -> Result<(), LeadSyncStateRepositoryError>;
}
