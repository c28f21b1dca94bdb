//! Lead assignment service.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::name_directory::NameDirectory;
use super::ports::{
    AssignLeadsRequest, AssignmentFailure, AssignmentReport, LeadAssignmentCommand,
    LeadRepository, StaffDirectory,
};
use super::store_errors::{map_lead_repository_error, map_staff_error};
use super::{Error, ErrorCode, HistoryEntry, LeadId, StaffUser};

/// Hands leads to sales executives on behalf of their seniors.
pub struct LeadAssignmentService<L, D> {
    leads: Arc<L>,
    staff: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<L, D> LeadAssignmentService<L, D> {
    /// Wire the service to the lead store and the staff roster.
    pub fn new(leads: Arc<L>, staff: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            leads,
            staff,
            clock,
        }
    }
}

impl<L, D> LeadAssignmentService<L, D>
where
    L: LeadRepository,
    D: StaffDirectory,
{
    async fn assign_one(
        &self,
        lead_id: LeadId,
        member: &StaffUser,
        actor: &StaffUser,
        request: &AssignLeadsRequest,
    ) -> Result<(), Error> {
        let mut lead = self
            .leads
            .find_by_id(lead_id)
            .await
            .map_err(map_lead_repository_error)?
            .ok_or_else(|| Error::not_found(format!("lead {lead_id} does not exist")))?;

        let now = self.clock.utc();
        let stored = if lead.assign_to(member, actor, now) {
            let entry = HistoryEntry::snapshot(&lead, &request.caller, now);
            self.leads.save_with_history(&lead, &entry).await
        } else {
            self.leads.save(&lead).await
        };
        stored.map_err(map_lead_repository_error)
    }
}

#[async_trait]
impl<L, D> LeadAssignmentCommand for LeadAssignmentService<L, D>
where
    L: LeadRepository,
    D: StaffDirectory,
{
    async fn assign(&self, request: AssignLeadsRequest) -> Result<AssignmentReport, Error> {
        if request.lead_ids.is_empty() {
            return Err(Error::invalid_request("at least one lead id is required")
                .with_details(json!({ "field": "leadIds", "code": "empty" })));
        }
        if request.caller.is_executive() {
            return Err(Error::forbidden("executives cannot assign leads"));
        }

        let directory = NameDirectory::new(self.staff.list_all().await.map_err(map_staff_error)?);
        let actor = directory.find(&request.caller.user_id).ok_or_else(|| {
            Error::not_found(format!("user {} does not exist", request.caller.user_id))
        })?;
        let member = directory.find(&request.sales_member_id).ok_or_else(|| {
            Error::not_found(format!(
                "sales member {} does not exist",
                request.sales_member_id
            ))
        })?;
        if !member.is_active {
            return Err(Error::invalid_request(format!(
                "sales member {} is inactive",
                member.id
            ))
            .with_details(json!({ "field": "salesMemberId", "code": "inactive" })));
        }

        let unique: BTreeSet<LeadId> = request.lead_ids.iter().copied().collect();
        let mut report = AssignmentReport::default();
        for lead_id in unique {
            match self.assign_one(lead_id, member, actor, &request).await {
                Ok(()) => report.assigned.push(lead_id),
                Err(err) if err.code() == ErrorCode::ServiceUnavailable => {
                    warn!(
                        lead_id = %lead_id,
                        assigned = report.assigned.len(),
                        "assignment aborted"
                    );
                    return Err(err.with_details(json!({
                        "abortedAtLead": lead_id,
                        "partialReport": report,
                    })));
                }
                Err(err) => {
                    warn!(lead_id = %lead_id, error = %err, "lead assignment failed");
                    report.failures.push(AssignmentFailure {
                        lead_id,
                        reason: err.message().to_owned(),
                    });
                }
            }
        }

        info!(
            member = %member.id,
            assigned_by = %actor.id,
            assigned = report.assigned.len(),
            failed = report.failures.len(),
            "leads assigned"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{LeadRepositoryError, MockLeadRepository, MockStaffDirectory};
    use crate::domain::{
        CallerContext, Disposition, HierarchyLevel, Lead, LeadDraft, LeadSource,
    };
    use crate::test_support::{MutableClock, caller, fixture_now, sample_org, user_id};
    use rstest::rstest;

    #[derive(Default)]
    struct Ports {
        leads: MockLeadRepository,
        staff: MockStaffDirectory,
    }

    impl Ports {
        fn with_org() -> Self {
            let mut ports = Self::default();
            ports.staff.expect_list_all().returning(|| Ok(sample_org()));
            ports
        }
    }

    fn service(ports: Ports) -> LeadAssignmentService<MockLeadRepository, MockStaffDirectory> {
        LeadAssignmentService::new(
            Arc::new(ports.leads),
            Arc::new(ports.staff),
            Arc::new(MutableClock::new(fixture_now())),
        )
    }

    fn lead(id: u64, disposition: Disposition) -> Lead {
        let mut lead = Lead::from_draft(
            LeadId::new(id),
            LeadDraft::new(LeadSource::Manual, fixture_now()),
            fixture_now(),
        );
        lead.disposition = disposition;
        lead
    }

    fn request(caller: CallerContext, ids: &[u64], member: &str) -> AssignLeadsRequest {
        AssignLeadsRequest {
            caller,
            lead_ids: ids.iter().copied().map(LeadId::new).collect(),
            sales_member_id: user_id(member),
        }
    }

    fn team_lead() -> CallerContext {
        caller("lead", HierarchyLevel::TeamLead)
    }

    fn assigned_to_exec_one(lead: &Lead) -> bool {
        lead.sales_executive == Some(user_id("exec-1"))
            && lead.sales_executive_name.as_deref() == Some("Esha Exec")
            && lead.assigned_by == Some(user_id("lead"))
            && lead.assigned_by_name.as_deref() == Some("Tara Lead")
            && lead.assigned_at == Some(fixture_now())
    }

    #[tokio::test]
    async fn reset_disposition_is_saved_with_its_history_entry() {
        let mut ports = Ports::with_org();
        ports
            .leads
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(Some(lead(1, Disposition::NotInterested))));
        ports.leads.expect_save().times(0);
        ports
            .leads
            .expect_save_with_history()
            .withf(|lead, entry| {
                assigned_to_exec_one(lead)
                    && lead.disposition == Disposition::NotOpen
                    && entry.lead_id == lead.lead_id
                    && entry.disposition == Disposition::NotOpen
                    && entry.updated_by == user_id("lead")
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let report = service(ports)
            .assign(request(team_lead(), &[1], "exec-1"))
            .await
            .expect("assignment succeeds");

        assert_eq!(report.assigned, vec![LeadId::new(1)]);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn kept_disposition_writes_no_history() {
        let mut ports = Ports::with_org();
        ports
            .leads
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(Some(lead(1, Disposition::Prospect))));
        ports
            .leads
            .expect_save()
            .withf(|lead| assigned_to_exec_one(lead) && lead.disposition == Disposition::Prospect)
            .times(1)
            .return_once(|_| Ok(()));
        ports.leads.expect_save_with_history().times(0);

        let report = service(ports)
            .assign(request(team_lead(), &[1], "exec-1"))
            .await
            .expect("assignment succeeds");

        assert_eq!(report.assigned, vec![LeadId::new(1)]);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn missing_leads_are_reported_without_aborting() {
        let mut ports = Ports::with_org();
        ports.leads.expect_find_by_id().times(2).returning(|id| {
            Ok((id == LeadId::new(2)).then(|| lead(2, Disposition::CallBack)))
        });
        ports.leads.expect_save().times(1).returning(|_| Ok(()));

        let report = service(ports)
            .assign(request(team_lead(), &[7, 2, 7], "exec-2"))
            .await
            .expect("partial success");

        assert_eq!(report.assigned, vec![LeadId::new(2)]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].lead_id, LeadId::new(7));
    }

    #[tokio::test]
    async fn outage_aborts_with_the_partial_report() {
        let mut ports = Ports::with_org();
        ports
            .leads
            .expect_find_by_id()
            .times(2)
            .returning(|id| Ok(Some(lead(id.get(), Disposition::NotInterested))));
        ports
            .leads
            .expect_save_with_history()
            .times(2)
            .returning(|lead, _| {
                if lead.lead_id == LeadId::new(1) {
                    Ok(())
                } else {
                    Err(LeadRepositoryError::connection("history table locked"))
                }
            });

        let err = service(ports)
            .assign(request(team_lead(), &[3, 1, 2], "exec-1"))
            .await
            .expect_err("store unavailable");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        let details = err.details().expect("partial report attached");
        assert_eq!(details["abortedAtLead"], json!(2));
        assert_eq!(details["partialReport"]["assigned"], json!([1]));
        assert_eq!(details["partialReport"]["failures"], json!([]));
    }

    #[tokio::test]
    async fn empty_request_is_invalid() {
        let ports = Ports::default();

        let err = service(ports)
            .assign(request(team_lead(), &[], "exec-1"))
            .await
            .expect_err("empty ids");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn executives_cannot_assign() {
        let mut ports = Ports::default();
        ports.staff.expect_list_all().times(0);

        let err = service(ports)
            .assign(request(
                caller("exec-1", HierarchyLevel::Executive),
                &[1],
                "exec-2",
            ))
            .await
            .expect_err("forbidden");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case("ghost", "exec-1")]
    #[case("lead", "ghost")]
    #[tokio::test]
    async fn unknown_actor_or_member_is_not_found(#[case] actor: &str, #[case] member: &str) {
        let mut ports = Ports::with_org();
        ports.leads.expect_find_by_id().times(0);

        let err = service(ports)
            .assign(request(caller(actor, HierarchyLevel::Manager), &[1], member))
            .await
            .expect_err("not found");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn inactive_member_is_rejected() {
        let mut ports = Ports::default();
        ports.staff.expect_list_all().returning(|| {
            let mut users = sample_org();
            for user in &mut users {
                if user.id.as_str() == "exec-2" {
                    user.is_active = false;
                }
            }
            Ok(users)
        });

        let err = service(ports)
            .assign(request(team_lead(), &[1], "exec-2"))
            .await
            .expect_err("inactive");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
