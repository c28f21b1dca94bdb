//! Behaviour tests for the lead lifecycle.
//!
//! Scenarios drive the real domain services against the in-memory adapters,
//! covering intake, deduplication, assignment and disposition updates.

use std::sync::Arc;

use chrono::TimeDelta;
use leads_backend::domain::ports::{
    AssignLeadsRequest, IngestOutcome, LeadAssignmentCommand, LeadDispositionCommand,
    LeadHistoryRepository, LeadIngestionCommand, LeadReportingQuery, LeadRepository,
    LeadsForCallerRequest, ManualLeadRequest, UpdateDispositionRequest,
};
use leads_backend::domain::{
    CallerContext, DateRange, Disposition, DispositionUpdate, Error, ErrorCode, HierarchyLevel,
    Lead, LeadAssignmentService, LeadDispositionService, LeadDraft, LeadId, LeadIngestionService,
    LeadReportingService, LeadSource, PhoneNumber,
};
use leads_backend::outbound::memory::{
    InMemoryLeadHistory, InMemoryLeadRepository, InMemoryLeadSequence, InMemoryStaffDirectory,
};
use leads_backend::test_support::{MutableClock, caller, fixture_now, sample_org, user_id};
use mockable::Clock;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

type Leads = InMemoryLeadRepository;
type History = InMemoryLeadHistory;
type Staff = InMemoryStaffDirectory;

/// Services wired over shared in-memory stores.
struct Harness {
    runtime: Runtime,
    leads: Arc<Leads>,
    history: Arc<History>,
    ingestion: LeadIngestionService<Leads, InMemoryLeadSequence, Staff>,
    assignment: LeadAssignmentService<Leads, Staff>,
    disposition: LeadDispositionService<Leads>,
    reporting: LeadReportingService<Leads, History, Staff>,
}

impl Harness {
    fn new() -> Self {
        let runtime = Runtime::new().expect("create runtime");
        let clock: Arc<dyn Clock> = Arc::new(MutableClock::new(fixture_now()));
        let history = Arc::new(History::new());
        let leads = Arc::new(Leads::with_history(history.clone()));
        let staff = Arc::new(Staff::new(sample_org()));
        Self {
            runtime,
            ingestion: LeadIngestionService::new(
                leads.clone(),
                Arc::new(InMemoryLeadSequence::new()),
                staff.clone(),
                clock.clone(),
            ),
            assignment: LeadAssignmentService::new(leads.clone(), staff.clone(), clock.clone()),
            disposition: LeadDispositionService::new(leads.clone(), clock),
            reporting: LeadReportingService::new(leads.clone(), history.clone(), staff),
            leads,
            history,
        }
    }
}

/// Resolve a `sample_org` member id to a caller.
fn caller_for(user: &str) -> CallerContext {
    let level = match user {
        "admin" => HierarchyLevel::SuperAdmin,
        "mgr" => HierarchyLevel::Manager,
        "lead" => HierarchyLevel::TeamLead,
        _ => HierarchyLevel::Executive,
    };
    caller(user, level)
}

#[derive(Default, ScenarioState)]
struct LeadLifecycleWorld {
    harness: Slot<Arc<Harness>>,
    last_outcome: Slot<IngestOutcome>,
    last_error: Slot<Error>,
}

impl LeadLifecycleWorld {
    fn harness(&self) -> Arc<Harness> {
        self.harness.get().expect("organisation should be set up")
    }

    fn record<T>(&self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.last_error.set(err);
                None
            }
        }
    }

    fn find_lead(&self, lead_id: u64) -> Lead {
        let harness = self.harness();
        harness
            .runtime
            .block_on(harness.leads.find_by_id(LeadId::new(lead_id)))
            .expect("lead lookup")
            .expect("lead should exist")
    }

    fn key_in_lead(&self, user: &str, phone: String) {
        let harness = self.harness();
        let request = ManualLeadRequest {
            caller: caller_for(user),
            created_at: None,
            phone,
            company_name: Some("Acme Traders".to_owned()),
            contact_name: Some("Ravi".to_owned()),
            email: None,
            city: Some("Pune".to_owned()),
            looking_for: None,
            requirement: None,
            alternate_number: None,
            profile_score: None,
            remarks: None,
            disposition: None,
            sub_disposition: None,
            sales_executive: None,
            follow_up_date: None,
        };
        let result = harness
            .runtime
            .block_on(harness.ingestion.create_manual(request));
        if let Some(outcome) = self.record(result) {
            self.last_outcome.set(outcome);
        }
    }

    fn assign_lead(&self, user: &str, lead_id: u64, member: &str) {
        let harness = self.harness();
        let request = AssignLeadsRequest {
            caller: caller_for(user),
            lead_ids: vec![LeadId::new(lead_id)],
            sales_member_id: user_id(member),
        };
        let result = harness.runtime.block_on(harness.assignment.assign(request));
        if let Some(report) = self.record(result) {
            assert!(
                report.failures.is_empty(),
                "unexpected failures: {:?}",
                report.failures
            );
        }
    }

    fn record_outcome(&self, user: &str, label: &str, lead_id: u64) {
        let harness = self.harness();
        let request = UpdateDispositionRequest {
            caller: caller_for(user),
            lead_id: LeadId::new(lead_id),
            update: DispositionUpdate {
                disposition: Disposition::from_label(label.trim_matches('"')),
                sub_disposition: "Spoke to owner".to_owned(),
                follow_up_date: Some(fixture_now() + TimeDelta::days(2)),
                remarks: Some("called from the panel".to_owned()),
            },
        };
        let result = harness
            .runtime
            .block_on(harness.disposition.update_disposition(request));
        self.record(result);
    }
}

#[fixture]
fn world() -> LeadLifecycleWorld {
    LeadLifecycleWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a sales organisation with in-memory stores")]
fn a_sales_organisation(world: &LeadLifecycleWorld) {
    world.harness.set(Arc::new(Harness::new()));
}

#[given("{user} keys in a lead with phone {phone}")]
fn a_lead_was_keyed_in(world: &LeadLifecycleWorld, user: String, phone: String) {
    world.key_in_lead(&user, phone);
}

#[given("{user} assigns lead {lead_id} to {member}")]
fn a_lead_was_assigned(world: &LeadLifecycleWorld, user: String, lead_id: u64, member: String) {
    world.assign_lead(&user, lead_id, &member);
}

#[given("{user} records the outcome {label} on lead {lead_id}")]
fn an_outcome_was_recorded(world: &LeadLifecycleWorld, user: String, label: String, lead_id: u64) {
    world.record_outcome(&user, &label, lead_id);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("{user} keys in a lead with phone {phone}")]
fn keys_in_a_lead(world: &LeadLifecycleWorld, user: String, phone: String) {
    world.key_in_lead(&user, phone);
}

#[when("a lead-ads enquiry arrives for phone {phone}")]
fn a_lead_ads_enquiry_arrives(world: &LeadLifecycleWorld, phone: String) {
    let harness = world.harness();
    let draft = LeadDraft::new(LeadSource::Facebook, fixture_now())
        .with_phone(PhoneNumber::new(&phone).expect("valid phone"));
    let result = harness.runtime.block_on(harness.ingestion.ingest(draft));
    if let Some(outcome) = world.record(result) {
        world.last_outcome.set(outcome);
    }
}

#[when("{user} assigns lead {lead_id} to {member}")]
fn assigns_a_lead(world: &LeadLifecycleWorld, user: String, lead_id: u64, member: String) {
    world.assign_lead(&user, lead_id, &member);
}

#[when("{user} records the outcome {label} on lead {lead_id}")]
fn records_an_outcome(world: &LeadLifecycleWorld, user: String, label: String, lead_id: u64) {
    world.record_outcome(&user, &label, lead_id);
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("lead {lead_id} is created with profile {profile_id}")]
fn lead_is_created(world: &LeadLifecycleWorld, lead_id: u64, profile_id: String) {
    let outcome = world.last_outcome.get().expect("an ingest outcome");
    assert!(outcome.is_created(), "expected a new lead, got {outcome:?}");
    assert_eq!(outcome.lead().lead_id, LeadId::new(lead_id));
    assert_eq!(outcome.lead().profile_id.as_str(), profile_id);
}

#[then("the outcome is a duplicate of lead {lead_id}")]
fn outcome_is_duplicate(world: &LeadLifecycleWorld, lead_id: u64) {
    let outcome = world.last_outcome.get().expect("an ingest outcome");
    assert!(!outcome.is_created(), "expected a duplicate, got {outcome:?}");
    assert_eq!(outcome.lead().lead_id, LeadId::new(lead_id));
}

#[then("{count} leads are stored")]
fn leads_are_stored(world: &LeadLifecycleWorld, count: usize) {
    let harness = world.harness();
    assert_eq!(harness.runtime.block_on(harness.leads.len()), count);
}

#[then("lead {lead_id} has {count} history entries")]
fn lead_has_history(world: &LeadLifecycleWorld, lead_id: u64, count: usize) {
    let harness = world.harness();
    let entries = harness
        .runtime
        .block_on(harness.history.list_for_lead(LeadId::new(lead_id)))
        .expect("history lookup");
    assert_eq!(entries.len(), count);
}

#[then("lead {lead_id} is open again for re-enquiry")]
fn lead_is_reopened(world: &LeadLifecycleWorld, lead_id: u64) {
    let lead = world.find_lead(lead_id);
    assert_eq!(lead.disposition, Disposition::NotOpen);
    assert_eq!(lead.sub_disposition, "Hot Lead");
    assert!(lead.re_enquire);
    assert_eq!(lead.sales_executive, Some(user_id("exec-1")));
}

#[then("{user} sees lead {lead_id} in their list")]
fn sees_lead_in_list(world: &LeadLifecycleWorld, user: String, lead_id: u64) {
    let harness = world.harness();
    let range = DateRange::new(
        fixture_now() - TimeDelta::days(1),
        fixture_now() + TimeDelta::days(1),
    )
    .expect("valid range");
    let leads = harness
        .runtime
        .block_on(harness.reporting.leads_for_caller(LeadsForCallerRequest {
            caller: caller_for(&user),
            range,
        }))
        .expect("leads for caller");
    let ids: Vec<LeadId> = leads.iter().map(|lead| lead.lead_id).collect();
    assert_eq!(ids, vec![LeadId::new(lead_id)]);
    assert_eq!(leads[0].disposition, Disposition::FollowUp);
}

#[then("the request fails with forbidden")]
fn request_is_forbidden(world: &LeadLifecycleWorld) {
    let error = world.last_error.get().expect("an error should be recorded");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "A keyed-in lead receives the next id"
)]
fn keyed_in_lead_receives_next_id(world: LeadLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "A repeated phone number returns the existing lead"
)]
fn repeated_phone_returns_existing_lead(world: LeadLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "A lead-ads re-enquiry reopens a closed lead"
)]
fn lead_ads_reenquiry_reopens_lead(world: LeadLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "An executive works an assigned lead"
)]
fn executive_works_assigned_lead(world: LeadLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "Executives cannot touch leads they do not own"
)]
fn executives_cannot_touch_foreign_leads(world: LeadLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lead_lifecycle.feature",
    name = "Executives cannot hand out leads"
)]
fn executives_cannot_hand_out_leads(world: LeadLifecycleWorld) {
    let _ = world;
}
