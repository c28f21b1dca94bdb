//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`LeadSequence`], [`StaffDirectory`],
//! [`LeadAdsSource`]) are implemented by outbound adapters. Driving ports
//! (`*Command`, `*Query`) are implemented by domain services and consumed by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod lead_administration_command;
mod lead_ads_source;
mod lead_ads_sync_command;
mod lead_assignment_command;
mod lead_disposition_command;
mod lead_history_repository;
mod lead_ingestion_command;
mod lead_reporting_query;
mod lead_repository;
mod lead_sequence;
mod lead_sync_state_repository;
mod staff_directory;

#[cfg(test)]
pub use lead_administration_command::MockLeadAdministrationCommand;
pub use lead_administration_command::LeadAdministrationCommand;
#[cfg(test)]
pub use lead_ads_source::MockLeadAdsSource;
pub use lead_ads_source::{
    LeadAdsSource, LeadAdsSourceError, LeadForm, SourceField, SourceLead, SourceLeadPage,
};
#[cfg(test)]
pub use lead_ads_sync_command::MockLeadAdsSyncCommand;
pub use lead_ads_sync_command::{FormSyncFailure, LeadAdsSyncCommand, LeadAdsSyncReport};
#[cfg(test)]
pub use lead_assignment_command::MockLeadAssignmentCommand;
pub use lead_assignment_command::{
    AssignLeadsRequest, AssignmentFailure, AssignmentReport, LeadAssignmentCommand,
};
#[cfg(test)]
pub use lead_disposition_command::MockLeadDispositionCommand;
pub use lead_disposition_command::{LeadDispositionCommand, UpdateDispositionRequest};
#[cfg(test)]
pub use lead_history_repository::MockLeadHistoryRepository;
pub use lead_history_repository::{LeadHistoryRepository, LeadHistoryRepositoryError};
#[cfg(test)]
pub use lead_ingestion_command::MockLeadIngestionCommand;
pub use lead_ingestion_command::{
    ImportDuplicate, ImportFailure, ImportLeadsRequest, ImportReport, ImportRow, IngestOutcome,
    LeadIngestionCommand, ManualLeadRequest,
};
#[cfg(test)]
pub use lead_reporting_query::MockLeadReportingQuery;
pub use lead_reporting_query::{
    Dashboard, DashboardLead, DashboardRequest, HotLeadRow, LeadDetail, LeadReportingQuery,
    LeadsForCallerRequest, MemberLeadCounts, MemberSummary, ResolvedHistoryEntry,
    SalesPanelRequest, TeamTree,
};
#[cfg(test)]
pub use lead_repository::MockLeadRepository;
pub use lead_repository::{LeadRepository, LeadRepositoryError};
#[cfg(test)]
pub use lead_sequence::MockLeadSequence;
pub use lead_sequence::{LeadSequence, LeadSequenceError};
#[cfg(test)]
pub use lead_sync_state_repository::MockLeadSyncStateRepository;
pub use lead_sync_state_repository::{LeadSyncStateRepository, LeadSyncStateRepositoryError};
#[cfg(test)]
pub use staff_directory::MockStaffDirectory;
pub use staff_directory::{StaffDirectory, StaffDirectoryError};
