//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::test::TestRequest;
use actix_web::web;

use crate::domain::HierarchyLevel;
use crate::domain::ports::{
    MockLeadAdministrationCommand, MockLeadAdsSyncCommand, MockLeadAssignmentCommand,
    MockLeadDispositionCommand, MockLeadIngestionCommand, MockLeadReportingQuery,
};
use crate::inbound::http::caller::{HIERARCHY_LEVEL_HEADER, ROLE_HEADER, USER_ID_HEADER};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Mocked driving ports; unset expectations fail the test when called.
#[derive(Default)]
pub struct MockPorts {
    pub ingestion: MockLeadIngestionCommand,
    pub assignment: MockLeadAssignmentCommand,
    pub disposition: MockLeadDispositionCommand,
    pub reporting: MockLeadReportingQuery,
    pub administration: MockLeadAdministrationCommand,
    pub lead_ads_sync: Option<MockLeadAdsSyncCommand>,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        let state = HttpState::new(HttpStatePorts {
            ingestion: Arc::new(self.ingestion),
            assignment: Arc::new(self.assignment),
            disposition: Arc::new(self.disposition),
            reporting: Arc::new(self.reporting),
            administration: Arc::new(self.administration),
        });
        let state = match self.lead_ads_sync {
            Some(sync) => state.with_lead_ads_sync(Arc::new(sync)),
            None => state,
        };
        web::Data::new(state)
    }
}

/// Attach gateway identity headers to a test request.
pub fn as_caller(request: TestRequest, user_id: &str, level: HierarchyLevel) -> TestRequest {
    request
        .insert_header((USER_ID_HEADER, user_id))
        .insert_header((HIERARCHY_LEVEL_HEADER, level.as_str()))
        .insert_header((ROLE_HEADER, "sales"))
}
