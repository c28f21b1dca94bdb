//! In-memory `LeadRepository`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{LeadRepository, LeadRepositoryError};
use crate::domain::{HistoryEntry, Lead, LeadId, LeadQuery, PhoneNumber};

use super::InMemoryLeadHistory;

/// Leads keyed by id. Phone numbers are unique across stored leads.
///
/// History entries are pushed while the lead map is locked and only after
/// the write is known to succeed, so readers never see one without the other.
#[derive(Debug, Default)]
pub struct InMemoryLeadRepository {
    leads: Mutex<BTreeMap<LeadId, Lead>>,
    history: Arc<InMemoryLeadHistory>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that records history into a log shared with its readers.
    pub fn with_history(history: Arc<InMemoryLeadHistory>) -> Self {
        Self {
            leads: Mutex::default(),
            history,
        }
    }

    /// Log receiving this store's history entries.
    pub fn history(&self) -> Arc<InMemoryLeadHistory> {
        Arc::clone(&self.history)
    }

    /// Number of stored leads.
    pub async fn len(&self) -> usize {
        self.leads.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.leads.lock().await.is_empty()
    }
}

fn phone_owner<'a>(
    leads: &'a BTreeMap<LeadId, Lead>,
    phone: &PhoneNumber,
) -> Option<&'a Lead> {
    leads
        .values()
        .find(|lead| lead.phone_number.as_ref() == Some(phone))
}

fn check_insert(leads: &BTreeMap<LeadId, Lead>, lead: &Lead) -> Result<(), LeadRepositoryError> {
    if leads.contains_key(&lead.lead_id) {
        return Err(LeadRepositoryError::duplicate_id(lead.lead_id.get()));
    }
    if let Some(phone) = &lead.phone_number {
        if phone_owner(leads, phone).is_some() {
            return Err(LeadRepositoryError::duplicate_phone(phone.as_str()));
        }
    }
    Ok(())
}

fn check_save(leads: &BTreeMap<LeadId, Lead>, lead: &Lead) -> Result<(), LeadRepositoryError> {
    if let Some(phone) = &lead.phone_number {
        if phone_owner(leads, phone).is_some_and(|owner| owner.lead_id != lead.lead_id) {
            return Err(LeadRepositoryError::duplicate_phone(phone.as_str()));
        }
    }
    if !leads.contains_key(&lead.lead_id) {
        return Err(LeadRepositoryError::missing(lead.lead_id.get()));
    }
    Ok(())
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_id(&self, lead_id: LeadId) -> Result<Option<Lead>, LeadRepositoryError> {
        Ok(self.leads.lock().await.get(&lead_id).cloned())
    }

    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Lead>, LeadRepositoryError> {
        let leads = self.leads.lock().await;
        Ok(phone_owner(&leads, phone).cloned())
    }

    async fn insert(&self, lead: &Lead) -> Result<(), LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        check_insert(&leads, lead)?;
        leads.insert(lead.lead_id, lead.clone());
        Ok(())
    }

    async fn insert_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        check_insert(&leads, lead)?;
        self.history.push(entry).await;
        leads.insert(lead.lead_id, lead.clone());
        Ok(())
    }

    async fn save(&self, lead: &Lead) -> Result<(), LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        check_save(&leads, lead)?;
        leads.insert(lead.lead_id, lead.clone());
        Ok(())
    }

    async fn save_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        check_save(&leads, lead)?;
        self.history.push(entry).await;
        leads.insert(lead.lead_id, lead.clone());
        Ok(())
    }

    async fn query(&self, query: &LeadQuery) -> Result<Vec<Lead>, LeadRepositoryError> {
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }
        let leads = self.leads.lock().await;
        Ok(leads
            .values()
            .filter(|lead| query.matches(lead))
            .cloned()
            .collect())
    }

    async fn delete_all(&self, lead_ids: &[LeadId]) -> Result<u64, LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        let removed = lead_ids
            .iter()
            .filter(|lead_id| leads.remove(lead_id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn clear_assignments(&self) -> Result<u64, LeadRepositoryError> {
        let mut leads = self.leads.lock().await;
        let mut changed = 0;
        for lead in leads.values_mut() {
            if lead.sales_executive.is_some() || lead.sales_executive_name.is_some() {
                lead.clear_assignment();
                changed += 1;
            }
        }
        Ok(changed)
    }
}
