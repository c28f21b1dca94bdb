//! In-memory `LeadHistoryRepository`.
//!
//! Entries arrive through [`InMemoryLeadRepository`](super::InMemoryLeadRepository),
//! which holds the log and writes to it under its own lock.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{LeadHistoryRepository, LeadHistoryRepositoryError};
use crate::domain::{HistoryEntry, LeadId};

/// Append-only vector of history entries.
#[derive(Debug, Default)]
pub struct InMemoryLeadHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryLeadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn push(&self, entry: &HistoryEntry) {
        self.entries.lock().await.push(entry.clone());
    }

    /// Number of recorded entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl LeadHistoryRepository for InMemoryLeadHistory {
    async fn list_for_lead(
        &self,
        lead_id: LeadId,
    ) -> Result<Vec<HistoryEntry>, LeadHistoryRepositoryError> {
        self.list_for_leads(&[lead_id]).await
    }

    async fn list_for_leads(
        &self,
        lead_ids: &[LeadId],
    ) -> Result<Vec<HistoryEntry>, LeadHistoryRepositoryError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|entry| lead_ids.contains(&entry.lead_id))
            .cloned()
            .collect())
    }
}
