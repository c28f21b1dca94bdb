//! Port for the lead id counter.

use async_trait::async_trait;

use crate::domain::LeadId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by lead sequence adapters.
    pub enum LeadSequenceError {
        /// Counter store connection could not be established.
        Connection { message: String } =>
            "lead sequence connection failed: {message}",
        /// Increment failed during execution.
        Query { message: String } =>
            "lead sequence increment failed: {message}",
    }
}

/// Monotonic counter issuing lead ids.
///
/// `next_lead_id` is an atomic increment: concurrent callers always receive
/// distinct values. Values may be skipped but are never reused.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadSequence: Send + Sync {
    async fn next_lead_id(&self) -> Result<LeadId, LeadSequenceError>;
}
