//! PostgreSQL-backed `LeadHistoryRepository`.
//!
//! Rows are written by `DieselLeadRepository` alongside the lead they
//! describe; this adapter only reads them.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LeadHistoryRepository, LeadHistoryRepositoryError};
use crate::domain::{HistoryEntry, LeadId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{HistoryRow, lead_key};
use super::pool::{DbPool, PoolError};
use super::schema::lead_history;

/// Diesel-backed reader of the append-only history log.
#[derive(Clone)]
pub struct DieselLeadHistoryRepository {
    pool: DbPool,
}

impl DieselLeadHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> LeadHistoryRepositoryError {
    map_pool_error(error, LeadHistoryRepositoryError::connection)
}

fn diesel_error(
    operation: &str,
) -> impl FnOnce(diesel::result::Error) -> LeadHistoryRepositoryError + '_ {
    move |error| {
        map_diesel_error(
            error,
            operation,
            LeadHistoryRepositoryError::query,
            LeadHistoryRepositoryError::connection,
        )
    }
}

#[async_trait]
impl LeadHistoryRepository for DieselLeadHistoryRepository {
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
        if lead_ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = lead_ids
            .iter()
            .map(|lead_id| lead_key(*lead_id))
            .collect::<Result<Vec<_>, _>>()
            .map_err(LeadHistoryRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<HistoryRow> = lead_history::table
            .filter(lead_history::lead_id.eq_any(keys))
            .order(lead_history::seq.asc())
            .select(HistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list history entries"))?;
        rows.into_iter()
            .map(HistoryEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(LeadHistoryRepositoryError::query)
    }
}
