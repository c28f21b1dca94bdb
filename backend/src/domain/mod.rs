//! Domain primitives, aggregates and services.
//!
//! Purpose: Define the strongly typed lead lifecycle model (staff hierarchy,
//! leads, dispositions, history) and the services that drive it through the
//! ports in [`ports`]. Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Lead, LeadDraft, LeadId, ProfileId, PhoneNumber: the lead aggregate.
//! - StaffUser, CallerContext, HierarchyLevel: the sales hierarchy.
//! - `*Service` types: implementations of the driving ports.

pub mod disposition;
pub mod error;
pub mod hierarchy;
pub mod history;
pub mod lead;
pub mod lead_import;
pub mod lead_query;
pub mod name_directory;
pub mod ports;
pub mod trace_id;
pub mod user;

mod lead_administration;
mod lead_ads_sync;
mod lead_assignment;
mod lead_disposition;
mod lead_ingestion;
mod lead_reporting;
mod store_errors;

pub use self::disposition::Disposition;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::hierarchy::{HierarchyIssue, TeamNode};
pub use self::history::HistoryEntry;
pub use self::lead::{
    DispositionUpdate, Lead, LeadDraft, LeadFields, LeadId, LeadSource, LeadValidationError,
    PhoneNumber, ProfileId,
};
pub use self::lead_administration::LeadAdministrationService;
pub use self::lead_ads_sync::{LeadAdsSyncService, draft_from_submission};
pub use self::lead_assignment::LeadAssignmentService;
pub use self::lead_disposition::LeadDispositionService;
pub use self::lead_ingestion::LeadIngestionService;
pub use self::lead_query::{DateRange, ExecutiveFilter, LeadQuery, LeadSearch, LeadTimeField};
pub use self::lead_reporting::LeadReportingService;
pub use self::name_directory::NameDirectory;
pub use self::trace_id::TraceId;
pub use self::user::{CallerContext, HierarchyLevel, StaffUser, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use leads_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
