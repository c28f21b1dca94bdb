//! PostgreSQL-backed `StaffDirectory`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StaffDirectory, StaffDirectoryError};
use crate::domain::{StaffUser, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::StaffUserRow;
use super::pool::{DbPool, PoolError};
use super::schema::staff_users;

/// Diesel-backed staff directory.
#[derive(Clone)]
pub struct DieselStaffDirectory {
    pool: DbPool,
}

impl DieselStaffDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> StaffDirectoryError {
    map_pool_error(error, StaffDirectoryError::connection)
}

fn diesel_error(operation: &str) -> impl FnOnce(diesel::result::Error) -> StaffDirectoryError + '_ {
    move |error| {
        map_diesel_error(
            error,
            operation,
            StaffDirectoryError::query,
            StaffDirectoryError::connection,
        )
    }
}

#[async_trait]
impl StaffDirectory for DieselStaffDirectory {
    async fn list_all(&self) -> Result<Vec<StaffUser>, StaffDirectoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<StaffUserRow> = staff_users::table
            .order(staff_users::id.asc())
            .select(StaffUserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list staff"))?;
        rows.into_iter()
            .map(StaffUser::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StaffDirectoryError::query)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StaffUser>, StaffDirectoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<StaffUserRow> = staff_users::table
            .find(id.as_str())
            .select(StaffUserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find staff user"))?;
        row.map(StaffUser::try_from)
            .transpose()
            .map_err(StaffDirectoryError::query)
    }
}
