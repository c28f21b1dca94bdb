//! PostgreSQL-backed `LeadSyncStateRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LeadForm, LeadSyncStateRepository, LeadSyncStateRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::LeadAdFormRow;
use super::pool::{DbPool, PoolError};
use super::schema::{lead_ad_forms, lead_sync_state};

/// Watermark row key of the lead-ads sync.
const SYNC_SOURCE: &str = "facebook";

/// Diesel-backed sync bookkeeping.
#[derive(Clone)]
pub struct DieselLeadSyncStateRepository {
    pool: DbPool,
}

impl DieselLeadSyncStateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> LeadSyncStateRepositoryError {
    map_pool_error(error, LeadSyncStateRepositoryError::connection)
}

fn diesel_error(
    operation: &str,
) -> impl FnOnce(diesel::result::Error) -> LeadSyncStateRepositoryError + '_ {
    move |error| {
        map_diesel_error(
            error,
            operation,
            LeadSyncStateRepositoryError::query,
            LeadSyncStateRepositoryError::connection,
        )
    }
}

#[async_trait]
impl LeadSyncStateRepository for DieselLeadSyncStateRepository {
    async fn last_fetched(&self) -> Result<Option<DateTime<Utc>>, LeadSyncStateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        lead_sync_state::table
            .find(SYNC_SOURCE)
            .select(lead_sync_state::last_fetched)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("read sync watermark"))
    }

    async fn set_last_fetched(&self, at: DateTime<Utc>) -> Result<(), LeadSyncStateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(lead_sync_state::table)
            .values((
                lead_sync_state::source.eq(SYNC_SOURCE),
                lead_sync_state::last_fetched.eq(at),
            ))
            .on_conflict(lead_sync_state::source)
            .do_update()
            .set(lead_sync_state::last_fetched.eq(at))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("write sync watermark"))
    }

    async fn upsert_forms(
        &self,
        forms: &[LeadForm],
        seen_at: DateTime<Utc>,
    ) -> Result<(), LeadSyncStateRepositoryError> {
        if forms.is_empty() {
            return Ok(());
        }
        let rows: Vec<LeadAdFormRow<'_>> = forms
            .iter()
            .map(|form| LeadAdFormRow::new(form, seen_at))
            .collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(lead_ad_forms::table)
            .values(&rows)
            .on_conflict(lead_ad_forms::form_id)
            .do_update()
            .set((
                lead_ad_forms::name.eq(excluded(lead_ad_forms::name)),
                lead_ad_forms::status.eq(excluded(lead_ad_forms::status)),
                lead_ad_forms::locale.eq(excluded(lead_ad_forms::locale)),
                lead_ad_forms::last_updated.eq(excluded(lead_ad_forms::last_updated)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("upsert lead forms"))
    }
}
