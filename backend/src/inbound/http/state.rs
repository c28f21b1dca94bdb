//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle through `web::Data` and only ever talk to
//! the driving ports, so they stay testable with mocks.

use std::sync::Arc;

use crate::domain::ports::{
    LeadAdministrationCommand, LeadAdsSyncCommand, LeadAssignmentCommand, LeadDispositionCommand,
    LeadIngestionCommand, LeadReportingQuery,
};

/// Parameter object bundling the port implementations handlers need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub ingestion: Arc<dyn LeadIngestionCommand>,
    pub assignment: Arc<dyn LeadAssignmentCommand>,
    pub disposition: Arc<dyn LeadDispositionCommand>,
    pub reporting: Arc<dyn LeadReportingQuery>,
    pub administration: Arc<dyn LeadAdministrationCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub ingestion: Arc<dyn LeadIngestionCommand>,
    pub assignment: Arc<dyn LeadAssignmentCommand>,
    pub disposition: Arc<dyn LeadDispositionCommand>,
    pub reporting: Arc<dyn LeadReportingQuery>,
    pub administration: Arc<dyn LeadAdministrationCommand>,
    /// Absent when no lead-ads credentials are configured.
    pub lead_ads_sync: Option<Arc<dyn LeadAdsSyncCommand>>,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            ingestion,
            assignment,
            disposition,
            reporting,
            administration,
        } = ports;
        Self {
            ingestion,
            assignment,
            disposition,
            reporting,
            administration,
            lead_ads_sync: None,
        }
    }

    /// Enable the lead-ads sync endpoint.
    #[must_use]
    pub fn with_lead_ads_sync(mut self, sync: Arc<dyn LeadAdsSyncCommand>) -> Self {
        self.lead_ads_sync = Some(sync);
        self
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
