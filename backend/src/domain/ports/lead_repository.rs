//! Port for lead persistence.
//!
//! Implementations must enforce phone-number uniqueness at write time:
//! [`LeadRepository::insert`] reports a collision with
//! [`LeadRepositoryError::DuplicatePhone`] so concurrent ingestions of the same
//! phone number cannot both create a lead.
//!
//! History entries are written through this port together with the lead
//! they describe, so a stored change never lacks its audit record.

use async_trait::async_trait;

use crate::domain::{HistoryEntry, Lead, LeadId, LeadQuery, PhoneNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by lead repository adapters.
    pub enum LeadRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "lead repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "lead repository query failed: {message}",
        /// Another lead already owns this phone number.
        DuplicatePhone { phone: String } =>
            "a lead with phone number {phone} already exists",
        /// The lead id has already been used.
        DuplicateId { lead_id: u64 } =>
            "lead {lead_id} already exists",
        /// The lead to overwrite does not exist.
        Missing { lead_id: u64 } =>
            "lead {lead_id} does not exist",
    }
}

/// Lead storage keyed by [`LeadId`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Fetch one lead by id.
    async fn find_by_id(&self, lead_id: LeadId) -> Result<Option<Lead>, LeadRepositoryError>;

    /// Fetch the lead holding `phone`, if any.
    async fn find_by_phone(&self, phone: &PhoneNumber)
    -> Result<Option<Lead>, LeadRepositoryError>;

    /// Store a brand-new lead.
    async fn insert(&self, lead: &Lead) -> Result<(), LeadRepositoryError>;

    /// Store a brand-new lead and its first history entry in one commit.
    async fn insert_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError>;

    /// Overwrite an existing lead.
    async fn save(&self, lead: &Lead) -> Result<(), LeadRepositoryError>;

    /// Overwrite an existing lead and append `entry` in one commit.
    async fn save_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError>;

    /// Leads matching every predicate of `query`, in ascending id order.
    async fn query(&self, query: &LeadQuery) -> Result<Vec<Lead>, LeadRepositoryError>;

    /// Delete the given leads in one atomic commit, returning how many
    /// existed.
    async fn delete_all(&self, lead_ids: &[LeadId]) -> Result<u64, LeadRepositoryError>;

    /// Drop every executive assignment in one atomic commit, returning how
    /// many leads changed.
    async fn clear_assignments(&self) -> Result<u64, LeadRepositoryError>;
}
