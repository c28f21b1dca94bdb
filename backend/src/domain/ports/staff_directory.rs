//! Port for reading staff users.

use async_trait::async_trait;

use crate::domain::{StaffUser, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by staff directory adapters.
    pub enum StaffDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "staff directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "staff directory query failed: {message}",
    }
}

/// Read access to staff users. User administration lives elsewhere.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Every staff user, active or not, in a stable order.
    async fn list_all(&self) -> Result<Vec<StaffUser>, StaffDirectoryError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StaffUser>, StaffDirectoryError>;
}
