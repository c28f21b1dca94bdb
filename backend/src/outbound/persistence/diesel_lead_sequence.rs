//! PostgreSQL-backed `LeadSequence`.
//!
//! The counter row is bumped with a single `UPDATE ... RETURNING`, so
//! concurrent callers serialise on the row lock and never share a value.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::LeadId;
use crate::domain::ports::{LeadSequence, LeadSequenceError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::lead_counters;

/// Counter row seeded by the initial migration.
const LEAD_ID_COUNTER: &str = "lead_id";

/// Diesel-backed lead id counter.
#[derive(Clone)]
pub struct DieselLeadSequence {
    pool: DbPool,
}

impl DieselLeadSequence {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadSequence for DieselLeadSequence {
    async fn next_lead_id(&self) -> Result<LeadId, LeadSequenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, LeadSequenceError::connection))?;
        let value: i64 = diesel::update(lead_counters::table.find(LEAD_ID_COUNTER))
            .set(lead_counters::value.eq(lead_counters::value + 1))
            .returning(lead_counters::value)
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                map_diesel_error(
                    error,
                    "increment lead counter",
                    LeadSequenceError::query,
                    LeadSequenceError::connection,
                )
            })?;
        u64::try_from(value)
            .map(LeadId::new)
            .map_err(|_| LeadSequenceError::query(format!("counter went negative: {value}")))
    }
}
