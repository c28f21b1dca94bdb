//! In-memory `LeadSyncStateRepository`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::ports::{LeadForm, LeadSyncStateRepository, LeadSyncStateRepositoryError};

/// Form metadata as last seen by a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLeadForm {
    pub form: LeadForm,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SyncState {
    last_fetched: Option<DateTime<Utc>>,
    forms: BTreeMap<String, StoredLeadForm>,
}

/// Watermark and form metadata held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLeadSyncState {
    state: Mutex<SyncState>,
}

impl InMemoryLeadSyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forms seen so far, ordered by id.
    pub async fn forms(&self) -> Vec<StoredLeadForm> {
        self.state.lock().await.forms.values().cloned().collect()
    }
}

#[async_trait]
impl LeadSyncStateRepository for InMemoryLeadSyncState {
    async fn last_fetched(&self) -> Result<Option<DateTime<Utc>>, LeadSyncStateRepositoryError> {
        Ok(self.state.lock().await.last_fetched)
    }

    async fn set_last_fetched(&self, at: DateTime<Utc>) -> Result<(), LeadSyncStateRepositoryError> {
        self.state.lock().await.last_fetched = Some(at);
        Ok(())
    }

    async fn upsert_forms(
        &self,
        forms: &[LeadForm],
        seen_at: DateTime<Utc>,
    ) -> Result<(), LeadSyncStateRepositoryError> {
        let mut state = self.state.lock().await;
        for form in forms {
            state.forms.insert(
                form.id.clone(),
                StoredLeadForm {
                    form: form.clone(),
                    last_updated: seen_at,
                },
            );
        }
        Ok(())
    }
}
