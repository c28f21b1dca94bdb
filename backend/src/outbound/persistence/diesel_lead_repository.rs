//! PostgreSQL-backed `LeadRepository`.
//!
//! Phone uniqueness is enforced by the `leads_phone_number_key` partial
//! index; a losing insert surfaces as [`LeadRepositoryError::DuplicatePhone`].
//! Writes that carry a history entry insert it in the same transaction as the
//! lead row.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LeadRepository, LeadRepositoryError};
use crate::domain::{
    ExecutiveFilter, HistoryEntry, Lead, LeadId, LeadQuery, LeadSearch, LeadTimeField,
    PhoneNumber,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{LeadRow, NewHistoryRow, lead_key};
use super::pool::{DbPool, PoolError};
use super::schema::{lead_history, leads};

const PRIMARY_KEY_CONSTRAINT: &str = "leads_pkey";

/// Diesel-backed lead store.
#[derive(Clone)]
pub struct DieselLeadRepository {
    pool: DbPool,
}

impl DieselLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> LeadRepositoryError {
    map_pool_error(error, LeadRepositoryError::connection)
}

fn diesel_error(operation: &str) -> impl FnOnce(diesel::result::Error) -> LeadRepositoryError + '_ {
    move |error| {
        map_diesel_error(
            error,
            operation,
            LeadRepositoryError::query,
            LeadRepositoryError::connection,
        )
    }
}

/// Classify a failed write of `lead`, recognising unique violations.
fn write_error(lead: &Lead, operation: &str, error: diesel::result::Error) -> LeadRepositoryError {
    match unique_violation(&error) {
        Some(Some(PRIMARY_KEY_CONSTRAINT)) => LeadRepositoryError::duplicate_id(lead.lead_id.get()),
        Some(_) => {
            let phone = lead
                .phone_number
                .as_ref()
                .map_or_else(String::new, |phone| phone.as_str().to_owned());
            LeadRepositoryError::duplicate_phone(phone)
        }
        None => diesel_error(operation)(error),
    }
}

fn to_row(lead: &Lead) -> Result<LeadRow, LeadRepositoryError> {
    LeadRow::try_from(lead).map_err(LeadRepositoryError::query)
}

fn to_history_row(entry: &HistoryEntry) -> Result<NewHistoryRow<'_>, LeadRepositoryError> {
    NewHistoryRow::from_entry(entry).map_err(LeadRepositoryError::query)
}

fn to_leads(rows: Vec<LeadRow>) -> Result<Vec<Lead>, LeadRepositoryError> {
    rows.into_iter()
        .map(Lead::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(LeadRepositoryError::query)
}

fn to_keys(lead_ids: &[LeadId]) -> Result<Vec<i64>, LeadRepositoryError> {
    lead_ids
        .iter()
        .map(|lead_id| lead_key(*lead_id))
        .collect::<Result<Vec<_>, _>>()
        .map_err(LeadRepositoryError::query)
}

/// Translate a domain query into a boxed Diesel select.
fn filtered(query: &LeadQuery) -> Result<leads::BoxedQuery<'static, Pg>, LeadRepositoryError> {
    let mut select = leads::table.into_boxed();

    if let Some((field, range)) = query.window {
        let (start, end) = (range.start(), range.end());
        select = match field {
            LeadTimeField::CreatedAt => select.filter(leads::created_at.between(start, end)),
            LeadTimeField::UpdatedAt => select.filter(leads::updated_at.between(start, end)),
            LeadTimeField::AssignedAt => select.filter(leads::assigned_at.between(start, end)),
            LeadTimeField::FollowUpDate => {
                select.filter(leads::follow_up_date.between(start, end))
            }
        };
    }

    select = match &query.executive {
        ExecutiveFilter::Any => select,
        ExecutiveFilter::Unassigned => select.filter(leads::sales_executive.is_null()),
        ExecutiveFilter::OneOf(ids) => {
            let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
            select.filter(leads::sales_executive.eq_any(ids))
        }
    };

    if let Some(source) = query.source {
        select = select.filter(leads::source.eq(source.as_str()));
    }

    if let Some(search) = &query.search {
        select = match search {
            LeadSearch::Phone(phone) => {
                select.filter(leads::phone_number.eq(phone.as_str().to_owned()))
            }
            LeadSearch::CompanyName(name) => select.filter(leads::company_name.eq(name.clone())),
            LeadSearch::ProfileId(profile) => select.filter(leads::profile_id.eq(profile.clone())),
            LeadSearch::LeadId(lead_id) => {
                let key = lead_key(*lead_id).map_err(LeadRepositoryError::query)?;
                select.filter(leads::lead_id.eq(key))
            }
        };
    }

    Ok(select.order(leads::lead_id.asc()))
}

#[async_trait]
impl LeadRepository for DieselLeadRepository {
    async fn find_by_id(&self, lead_id: LeadId) -> Result<Option<Lead>, LeadRepositoryError> {
        let key = lead_key(lead_id).map_err(LeadRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<LeadRow> = leads::table
            .find(key)
            .select(LeadRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find lead by id"))?;
        row.map(Lead::try_from)
            .transpose()
            .map_err(LeadRepositoryError::query)
    }

    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Lead>, LeadRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<LeadRow> = leads::table
            .filter(leads::phone_number.eq(phone.as_str()))
            .select(LeadRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find lead by phone"))?;
        row.map(Lead::try_from)
            .transpose()
            .map_err(LeadRepositoryError::query)
    }

    async fn insert(&self, lead: &Lead) -> Result<(), LeadRepositoryError> {
        let row = to_row(lead)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(leads::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| write_error(lead, "insert lead", error))
    }

    async fn insert_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let row = to_row(lead)?;
        let history = to_history_row(entry)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(leads::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(lead_history::table)
                    .values(&history)
                    .execute(conn)
                    .await
                    .map(|_| ())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| write_error(lead, "insert lead with history", error))
    }

    async fn save(&self, lead: &Lead) -> Result<(), LeadRepositoryError> {
        let row = to_row(lead)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(leads::table.find(row.lead_id))
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(|error| write_error(lead, "save lead", error))?;
        if updated == 0 {
            return Err(LeadRepositoryError::missing(lead.lead_id.get()));
        }
        Ok(())
    }

    async fn save_with_history(
        &self,
        lead: &Lead,
        entry: &HistoryEntry,
    ) -> Result<(), LeadRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let row = to_row(lead)?;
        let history = to_history_row(entry)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(leads::table.find(row.lead_id))
                        .set(&row)
                        .execute(conn)
                        .await?;
                    // No row means no lead; the entry must not outlive it.
                    if updated > 0 {
                        diesel::insert_into(lead_history::table)
                            .values(&history)
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| write_error(lead, "save lead with history", error))?;
        if updated == 0 {
            return Err(LeadRepositoryError::missing(lead.lead_id.get()));
        }
        Ok(())
    }

    async fn query(&self, query: &LeadQuery) -> Result<Vec<Lead>, LeadRepositoryError> {
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }
        let select = filtered(query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<LeadRow> = select
            .select(LeadRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("query leads"))?;
        to_leads(rows)
    }

    async fn delete_all(&self, lead_ids: &[LeadId]) -> Result<u64, LeadRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let keys = to_keys(lead_ids)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(leads::table.filter(leads::lead_id.eq_any(keys)))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("delete leads"))?;
        Ok(deleted as u64)
    }

    async fn clear_assignments(&self) -> Result<u64, LeadRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let cleared = conn
            .transaction(|conn| {
                async move {
                    diesel::update(
                        leads::table.filter(
                            leads::sales_executive
                                .is_not_null()
                                .or(leads::sales_executive_name.is_not_null()),
                        ),
                    )
                    .set((
                        leads::sales_executive.eq(None::<String>),
                        leads::sales_executive_name.eq(None::<String>),
                    ))
                    .execute(conn)
                    .await
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("clear assignments"))?;
        Ok(cleared as u64)
    }
}
