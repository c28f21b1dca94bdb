//! Shared Diesel error mapping for the lead repositories.
//!
//! Each repository owns its error enum; these helpers take the enum's
//! `connection` and `query` constructors so the classification lives in one
//! place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure through the repository's connection constructor.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.message().to_owned())
}

/// Emit debug context for a failed Diesel operation.
pub(crate) fn log_diesel_error(error: &DieselError, operation: &str) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                operation,
                "diesel operation failed"
            );
        }
        _ => debug!(%error, operation, "diesel operation failed"),
    }
}

/// Map Diesel errors into connection or query errors.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    operation: &str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    log_diesel_error(&error, operation);
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection(format!("{operation}: database connection closed"))
        }
        DieselError::NotFound => query(format!("{operation}: record not found")),
        DieselError::QueryBuilderError(_) => query(format!("{operation}: invalid query")),
        _ => query(format!("{operation}: database error")),
    }
}

/// Name of the violated unique constraint, if the error is one.
pub(crate) fn unique_violation(error: &DieselError) -> Option<Option<&str>> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    fn map(error: DieselError) -> Mapped {
        map_diesel_error(error, "load leads", Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("refused"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("refused".to_owned()));
    }

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let mapped = map(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        ));
        assert!(matches!(mapped, Mapped::Connection(message) if message.starts_with("load leads")));
    }

    #[rstest]
    fn other_failures_are_query_errors() {
        assert_eq!(
            map(DieselError::NotFound),
            Mapped::Query("load leads: record not found".to_owned())
        );
    }

    #[rstest]
    fn unique_violations_are_detected() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(unique_violation(&error), Some(None));
        assert_eq!(unique_violation(&DieselError::NotFound), None);
    }
}
