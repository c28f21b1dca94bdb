//! In-memory `LeadSequence`.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::LeadId;
use crate::domain::ports::{LeadSequence, LeadSequenceError};

/// Counter starting at zero; the first issued id is 1.
#[derive(Debug, Default)]
pub struct InMemoryLeadSequence {
    value: Mutex<u64>,
}

impl InMemoryLeadSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume counting after `last_issued`.
    pub fn starting_after(last_issued: u64) -> Self {
        Self {
            value: Mutex::new(last_issued),
        }
    }
}

#[async_trait]
impl LeadSequence for InMemoryLeadSequence {
    async fn next_lead_id(&self) -> Result<LeadId, LeadSequenceError> {
        let mut value = self.value.lock().await;
        *value = value
            .checked_add(1)
            .ok_or_else(|| LeadSequenceError::query("lead id counter exhausted"))?;
        Ok(LeadId::new(*value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_receive_distinct_ids() {
        let sequence = Arc::new(InMemoryLeadSequence::starting_after(41));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sequence = Arc::clone(&sequence);
                tokio::spawn(async move { sequence.next_lead_id().await })
            })
            .collect();

        let mut issued = BTreeSet::new();
        for handle in handles {
            let id = handle.await.expect("task joins").expect("id issued");
            issued.insert(id.get());
        }

        assert_eq!(issued.len(), 16);
        assert_eq!(issued.first(), Some(&42));
        assert_eq!(issued.last(), Some(&57));
    }
}
