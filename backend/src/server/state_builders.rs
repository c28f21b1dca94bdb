//! Builders wiring driven adapters into the HTTP state.
//!
//! With a pool every port is served by PostgreSQL; without one the server
//! runs on process-local adapters with an empty staff roster.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use leads_backend::domain::ports::{
    LeadHistoryRepository, LeadRepository, LeadSequence, LeadSyncStateRepository, StaffDirectory,
};
use leads_backend::domain::{
    LeadAdministrationService, LeadAdsSyncService, LeadAssignmentService, LeadDispositionService,
    LeadIngestionService, LeadReportingService,
};
use leads_backend::inbound::http::state::{HttpState, HttpStatePorts};
use leads_backend::outbound::facebook::{GraphApiConfig, GraphApiLeadAdsSource};
use leads_backend::outbound::memory::{
    InMemoryLeadHistory, InMemoryLeadRepository, InMemoryLeadSequence, InMemoryLeadSyncState,
    InMemoryStaffDirectory,
};
use leads_backend::outbound::persistence::{
    DieselLeadHistoryRepository, DieselLeadRepository, DieselLeadSequence,
    DieselLeadSyncStateRepository, DieselStaffDirectory,
};

use super::ServerConfig;

/// Driven adapters shared by every lead service.
struct DrivenPorts<L, H, S, D, W> {
    leads: Arc<L>,
    history: Arc<H>,
    sequence: Arc<S>,
    staff: Arc<D>,
    sync_state: Arc<W>,
}

fn build_with_ports<L, H, S, D, W>(
    ports: DrivenPorts<L, H, S, D, W>,
    lead_ads: Option<GraphApiConfig>,
) -> std::io::Result<HttpState>
where
    L: LeadRepository + 'static,
    H: LeadHistoryRepository + 'static,
    S: LeadSequence + 'static,
    D: StaffDirectory + 'static,
    W: LeadSyncStateRepository + 'static,
{
    let DrivenPorts {
        leads,
        history,
        sequence,
        staff,
        sync_state,
    } = ports;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let ingestion = Arc::new(LeadIngestionService::new(
        leads.clone(),
        sequence,
        staff.clone(),
        clock.clone(),
    ));
    let state = HttpState::new(HttpStatePorts {
        ingestion: ingestion.clone(),
        assignment: Arc::new(LeadAssignmentService::new(
            leads.clone(),
            staff.clone(),
            clock.clone(),
        )),
        disposition: Arc::new(LeadDispositionService::new(leads.clone(), clock.clone())),
        reporting: Arc::new(LeadReportingService::new(leads.clone(), history, staff)),
        administration: Arc::new(LeadAdministrationService::new(leads)),
    });

    let Some(lead_ads) = lead_ads else {
        return Ok(state);
    };
    let source = GraphApiLeadAdsSource::new(lead_ads)
        .map_err(|err| std::io::Error::other(format!("lead ads client setup failed: {err}")))?;
    let sync = LeadAdsSyncService::new(Arc::new(source), sync_state, ingestion, clock);
    Ok(state.with_lead_ads_sync(Arc::new(sync)))
}

/// Build the HTTP state from the server configuration.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the Graph API client cannot be built.
pub(super) fn build_http_state(config: &mut ServerConfig) -> std::io::Result<HttpState> {
    let lead_ads = config.lead_ads.take();
    match &config.db_pool {
        Some(pool) => build_with_ports(
            DrivenPorts {
                leads: Arc::new(DieselLeadRepository::new(pool.clone())),
                history: Arc::new(DieselLeadHistoryRepository::new(pool.clone())),
                sequence: Arc::new(DieselLeadSequence::new(pool.clone())),
                staff: Arc::new(DieselStaffDirectory::new(pool.clone())),
                sync_state: Arc::new(DieselLeadSyncStateRepository::new(pool.clone())),
            },
            lead_ads,
        ),
        None => {
            let history = Arc::new(InMemoryLeadHistory::new());
            build_with_ports(
                DrivenPorts {
                    leads: Arc::new(InMemoryLeadRepository::with_history(history.clone())),
                    history,
                    sequence: Arc::new(InMemoryLeadSequence::new()),
                    staff: Arc::new(InMemoryStaffDirectory::new(Vec::new())),
                    sync_state: Arc::new(InMemoryLeadSyncState::new()),
                },
                lead_ads,
            )
        }
    }
}
