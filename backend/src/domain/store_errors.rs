//! Translation of driven-port failures into domain errors.
//!
//! Connection failures become `service_unavailable` so callers know a retry is
//! safe; everything else is an internal error.

use tracing::error;

use super::Error;
use super::ports::{
    LeadHistoryRepositoryError, LeadRepositoryError, LeadSequenceError,
    LeadSyncStateRepositoryError, StaffDirectoryError,
};

pub(crate) fn map_lead_repository_error(err: LeadRepositoryError) -> Error {
    error!(error = %err, "lead repository failure");
    match err {
        LeadRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("lead store unavailable: {message}"))
        }
        LeadRepositoryError::Missing { lead_id } => {
            Error::not_found(format!("lead {lead_id} does not exist"))
        }
        other => Error::internal(other.to_string()),
    }
}

pub(crate) fn map_history_error(err: LeadHistoryRepositoryError) -> Error {
    error!(error = %err, "lead history failure");
    match err {
        LeadHistoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("lead history unavailable: {message}"))
        }
        LeadHistoryRepositoryError::Query { message } => {
            Error::internal(format!("lead history error: {message}"))
        }
    }
}

pub(crate) fn map_sequence_error(err: LeadSequenceError) -> Error {
    error!(error = %err, "lead sequence failure");
    match err {
        LeadSequenceError::Connection { message } => {
            Error::service_unavailable(format!("lead sequence unavailable: {message}"))
        }
        LeadSequenceError::Query { message } => {
            Error::internal(format!("lead sequence error: {message}"))
        }
    }
}

pub(crate) fn map_staff_error(err: StaffDirectoryError) -> Error {
    error!(error = %err, "staff directory failure");
    match err {
        StaffDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("staff directory unavailable: {message}"))
        }
        StaffDirectoryError::Query { message } => {
            Error::internal(format!("staff directory error: {message}"))
        }
    }
}

pub(crate) fn map_sync_state_error(err: LeadSyncStateRepositoryError) -> Error {
    error!(error = %err, "sync state failure");
    match err {
        LeadSyncStateRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("sync state unavailable: {message}"))
        }
        LeadSyncStateRepositoryError::Query { message } => {
            Error::internal(format!("sync state error: {message}"))
        }
    }
}
