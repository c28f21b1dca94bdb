//! Scoped lead reads, dashboards and rollups.
//!
//! Every read is narrowed by the caller's place in the reporting tree:
//!
//! | caller       | visible leads                               |
//! |--------------|---------------------------------------------|
//! | executive    | leads assigned to the caller                |
//! | manager      | unassigned leads (the triage pool)          |
//! | team lead    | leads assigned to any transitive subordinate|
//! | super admin  | everything                                  |
//!
//! Display names are resolved against one staff snapshot per request.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::disposition::NOT_AVAILABLE;
use super::hierarchy::{audit, build_team_tree, resolve_subordinates, subordinate_ids};
use super::history::{sort_by_follow_up_desc, sort_by_update_desc};
use super::lead::field;
use super::lead_query::LeadTimeField;
use super::name_directory::NameDirectory;
use super::ports::{
    Dashboard, DashboardLead, DashboardRequest, HotLeadRow, LeadDetail, LeadHistoryRepository,
    LeadReportingQuery, LeadRepository, LeadsForCallerRequest, MemberLeadCounts, MemberSummary,
    ResolvedHistoryEntry, SalesPanelRequest, StaffDirectory, TeamTree,
};
use super::store_errors::{map_history_error, map_lead_repository_error, map_staff_error};
use super::{
    CallerContext, DateRange, Error, HierarchyLevel, HistoryEntry, Lead, LeadId, LeadQuery,
    LeadSearch, LeadSource, StaffUser, UserId,
};

/// Lead-ads extension keys left out of hot-lead exports.
const EXPORT_HIDDEN_FIELDS: [&str; 2] = [field::DATA_TAG, "your_mobile_number"];
const EXPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Caller plus everyone reporting to them; super admins see the whole staff.
fn team_members<'a>(caller: &CallerContext, directory: &'a NameDirectory) -> Vec<&'a StaffUser> {
    let users = directory.users();
    if caller.is_super_admin() {
        return users.iter().collect();
    }
    directory
        .find(&caller.user_id)
        .into_iter()
        .chain(resolve_subordinates(&caller.user_id, users))
        .collect()
}

fn team_ids(caller: &CallerContext, directory: &NameDirectory) -> Vec<UserId> {
    let mut ids: Vec<UserId> = team_members(caller, directory)
        .into_iter()
        .map(|user| user.id.clone())
        .collect();
    if !ids.contains(&caller.user_id) {
        ids.insert(0, caller.user_id.clone());
    }
    ids
}

/// Refresh denormalised names from the snapshot, keeping stored names for
/// users that have since left the directory.
fn fill_names(lead: &mut Lead, directory: &NameDirectory) {
    if let Some(name) = lead
        .sales_executive
        .as_ref()
        .and_then(|id| directory.name_of(id))
    {
        lead.sales_executive_name = Some(name.to_owned());
    }
    if let Some(name) = lead.assigned_by.as_ref().and_then(|id| directory.name_of(id)) {
        lead.assigned_by_name = Some(name.to_owned());
    }
}

fn resolve_history(
    entries: Vec<HistoryEntry>,
    directory: &NameDirectory,
) -> Vec<ResolvedHistoryEntry> {
    entries
        .into_iter()
        .map(|entry| ResolvedHistoryEntry {
            updated_by_name: directory.name_or_unknown(Some(&entry.updated_by)),
            entry,
        })
        .collect()
}

fn hot_lead_row(lead: Lead) -> HotLeadRow {
    let text = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let mut row = HotLeadRow::from([
        ("profileId".to_owned(), lead.profile_id.to_string()),
        (
            "phoneNumber".to_owned(),
            lead.phone_number.map(String::from).unwrap_or_default(),
        ),
        ("source".to_owned(), lead.source.to_string()),
        ("companyName".to_owned(), text(lead.company_name)),
        ("contactName".to_owned(), text(lead.contact_name)),
        ("email".to_owned(), text(lead.email)),
        ("city".to_owned(), text(lead.city)),
        ("disposition".to_owned(), lead.disposition.to_string()),
        ("subDisposition".to_owned(), lead.sub_disposition),
        ("remarks".to_owned(), text(lead.remarks)),
        ("reEnquire".to_owned(), lead.re_enquire.to_string()),
        (
            "createdAt".to_owned(),
            lead.created_at.format(EXPORT_DATE_FORMAT).to_string(),
        ),
    ]);
    for (key, value) in lead.fields {
        if !EXPORT_HIDDEN_FIELDS.contains(&key.as_str()) {
            row.entry(key).or_insert(value);
        }
    }
    row
}

/// Read-side service over the lead and history stores.
pub struct LeadReportingService<L, H, D> {
    leads: Arc<L>,
    history: Arc<H>,
    staff: Arc<D>,
}

impl<L, H, D> LeadReportingService<L, H, D> {
    /// Wire the service to the lead store, history log and staff roster.
    pub fn new(leads: Arc<L>, history: Arc<H>, staff: Arc<D>) -> Self {
        Self {
            leads,
            history,
            staff,
        }
    }
}

impl<L, H, D> LeadReportingService<L, H, D>
where
    L: LeadRepository,
    H: LeadHistoryRepository,
    D: StaffDirectory,
{
    async fn directory(&self) -> Result<NameDirectory, Error> {
        let users = self.staff.list_all().await.map_err(map_staff_error)?;
        Ok(NameDirectory::new(users))
    }

    async fn query(&self, query: &LeadQuery) -> Result<Vec<Lead>, Error> {
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }
        self.leads
            .query(query)
            .await
            .map_err(map_lead_repository_error)
    }

    async fn query_named(
        &self,
        query: &LeadQuery,
        directory: &NameDirectory,
    ) -> Result<Vec<Lead>, Error> {
        let mut leads = self.query(query).await?;
        for lead in &mut leads {
            fill_names(lead, directory);
        }
        Ok(leads)
    }

    /// Fetch a lead the caller may read.
    async fn visible_lead(&self, caller: &CallerContext, lead_id: LeadId) -> Result<Lead, Error> {
        let lead = self
            .leads
            .find_by_id(lead_id)
            .await
            .map_err(map_lead_repository_error)?
            .ok_or_else(|| Error::not_found(format!("lead {lead_id} does not exist")))?;
        if caller.is_executive() && !lead.is_assigned_to(&caller.user_id) {
            return Err(Error::forbidden(format!(
                "lead {lead_id} is not assigned to {}",
                caller.user_id
            )));
        }
        Ok(lead)
    }

    async fn history_of(&self, lead_id: LeadId) -> Result<Vec<HistoryEntry>, Error> {
        self.history
            .list_for_lead(lead_id)
            .await
            .map_err(map_history_error)
    }

    /// Dashboard scope: the team, or one member (managers expand to their
    /// subordinates).
    fn dashboard_scope(
        caller: &CallerContext,
        member_id: Option<&UserId>,
        directory: &NameDirectory,
    ) -> Result<Vec<UserId>, Error> {
        let team = team_ids(caller, directory);
        let Some(member_id) = member_id else {
            return Ok(team);
        };
        let member = directory
            .find(member_id)
            .ok_or_else(|| Error::not_found(format!("member {member_id} does not exist")))?;
        if !caller.is_super_admin() && !team.contains(member_id) {
            return Err(Error::forbidden(format!(
                "member {member_id} is outside the caller's team"
            )));
        }
        let mut scope = vec![member.id.clone()];
        if member.hierarchy_level == Some(HierarchyLevel::Manager) {
            scope.extend(subordinate_ids(&member.id, directory.users()));
        }
        Ok(scope)
    }
}

#[async_trait]
impl<L, H, D> LeadReportingQuery for LeadReportingService<L, H, D>
where
    L: LeadRepository,
    H: LeadHistoryRepository,
    D: StaffDirectory,
{
    async fn leads_for_caller(&self, request: LeadsForCallerRequest) -> Result<Vec<Lead>, Error> {
        let LeadsForCallerRequest { caller, range } = request;
        let directory = self.directory().await?;
        let base = LeadQuery::all().within(LeadTimeField::CreatedAt, range);
        let query = match caller.hierarchy_level {
            Some(HierarchyLevel::Executive) => base.owned_by(vec![caller.user_id.clone()]),
            Some(HierarchyLevel::Manager) => base.unassigned(),
            Some(HierarchyLevel::TeamLead) => {
                base.owned_by(subordinate_ids(&caller.user_id, directory.users()))
            }
            Some(HierarchyLevel::SuperAdmin) | None => base,
        };

        let mut leads = self.query_named(&query, &directory).await?;
        leads.sort_by_key(|lead| Reverse((lead.created_at, lead.lead_id)));
        debug!(caller = %caller.user_id, count = leads.len(), "scoped leads fetched");
        Ok(leads)
    }

    async fn sales_panel(&self, request: SalesPanelRequest) -> Result<Vec<Lead>, Error> {
        let SalesPanelRequest {
            caller,
            range,
            my_data,
        } = request;
        let directory = self.directory().await?;
        let team = team_ids(&caller, &directory);

        if my_data {
            let mut leads = self
                .query_named(&LeadQuery::all().owned_by(team), &directory)
                .await?;
            leads.sort_by_key(|lead| (lead.disposition.sort_rank(), lead.lead_id));
            return Ok(leads);
        }

        let owned = LeadQuery::all().owned_by(team);
        let follow_ups = owned
            .clone()
            .within(LeadTimeField::FollowUpDate, range);
        let assigned = owned.within(LeadTimeField::AssignedAt, range);

        let mut merged = BTreeMap::new();
        for lead in self
            .query_named(&follow_ups, &directory)
            .await?
            .into_iter()
            .chain(self.query_named(&assigned, &directory).await?)
        {
            merged.entry(lead.lead_id).or_insert(lead);
        }
        let mut leads: Vec<Lead> = merged.into_values().collect();
        leads.sort_by_key(|lead| Reverse((lead.updated_at, lead.lead_id)));
        Ok(leads)
    }

    async fn dashboard(&self, request: DashboardRequest) -> Result<Dashboard, Error> {
        let DashboardRequest {
            caller,
            range,
            member_id,
        } = request;
        let directory = self.directory().await?;
        let scope = Self::dashboard_scope(&caller, member_id.as_ref(), &directory)?;

        let query = LeadQuery::all()
            .owned_by(scope)
            .within(LeadTimeField::UpdatedAt, range);
        let mut leads = self.query_named(&query, &directory).await?;
        leads.sort_by_key(|lead| Reverse((lead.updated_at, lead.lead_id)));

        let ids: Vec<LeadId> = leads.iter().map(|lead| lead.lead_id).collect();
        let mut grouped: BTreeMap<LeadId, Vec<HistoryEntry>> = BTreeMap::new();
        if !ids.is_empty() {
            let entries = self
                .history
                .list_for_leads(&ids)
                .await
                .map_err(map_history_error)?;
            for entry in entries {
                grouped.entry(entry.lead_id).or_default().push(entry);
            }
        }

        let leads = leads
            .into_iter()
            .map(|lead| {
                let mut history = grouped.remove(&lead.lead_id).unwrap_or_default();
                sort_by_update_desc(&mut history);
                DashboardLead {
                    history: resolve_history(history, &directory),
                    lead,
                }
            })
            .collect();

        let members = if caller.is_super_admin() {
            directory
                .users()
                .iter()
                .filter(|user| user.id != caller.user_id)
                .map(MemberSummary::from)
                .collect()
        } else {
            team_members(&caller, &directory)
                .into_iter()
                .map(MemberSummary::from)
                .collect()
        };
        Ok(Dashboard { leads, members })
    }

    async fn member_lead_counts(
        &self,
        caller: CallerContext,
    ) -> Result<Vec<MemberLeadCounts>, Error> {
        let directory = self.directory().await?;
        let members = team_members(&caller, &directory);
        let ids: Vec<UserId> = members.iter().map(|user| user.id.clone()).collect();
        let leads = self.query(&LeadQuery::all().owned_by(ids)).await?;

        let mut by_member: BTreeMap<&UserId, BTreeMap<String, usize>> = BTreeMap::new();
        for lead in &leads {
            if let Some(owner) = lead.sales_executive.as_ref() {
                *by_member
                    .entry(owner)
                    .or_default()
                    .entry(lead.disposition.label().to_owned())
                    .or_default() += 1;
            }
        }

        Ok(members
            .into_iter()
            .map(|user| {
                let by_disposition = by_member.remove(&user.id).unwrap_or_default();
                MemberLeadCounts {
                    member: MemberSummary::from(user),
                    total_assigned: by_disposition.values().sum(),
                    by_disposition,
                }
            })
            .collect())
    }

    async fn allocated_leads(&self, caller: CallerContext) -> Result<Vec<Lead>, Error> {
        let directory = self.directory().await?;
        let query = LeadQuery::all().owned_by(team_ids(&caller, &directory));
        let mut leads = self.query_named(&query, &directory).await?;
        leads.sort_by_key(|lead| Reverse((lead.assigned_at, lead.lead_id)));
        Ok(leads)
    }

    async fn lead_detail(
        &self,
        caller: CallerContext,
        lead_id: LeadId,
    ) -> Result<LeadDetail, Error> {
        let mut lead = self.visible_lead(&caller, lead_id).await?;
        let directory = self.directory().await?;
        fill_names(&mut lead, &directory);

        let mut history = self.history_of(lead_id).await?;
        sort_by_follow_up_desc(&mut history);
        let last_call_back_date = history.get(1).and_then(|entry| entry.follow_up_date);

        Ok(LeadDetail {
            lead,
            history: resolve_history(history, &directory),
            last_call_back_date,
        })
    }

    async fn lead_history(
        &self,
        caller: CallerContext,
        lead_id: LeadId,
    ) -> Result<Vec<ResolvedHistoryEntry>, Error> {
        self.visible_lead(&caller, lead_id).await?;
        let directory = self.directory().await?;
        let mut history = self.history_of(lead_id).await?;
        sort_by_update_desc(&mut history);
        Ok(resolve_history(history, &directory))
    }

    async fn search(&self, caller: CallerContext, search: LeadSearch) -> Result<Vec<Lead>, Error> {
        let directory = self.directory().await?;
        let mut query = LeadQuery::all().searching(search);
        if caller.is_executive() {
            query = query.owned_by(vec![caller.user_id.clone()]);
        }
        self.query_named(&query, &directory).await
    }

    async fn team_tree(&self, caller: CallerContext) -> Result<TeamTree, Error> {
        let directory = self.directory().await?;
        let issues = audit(directory.users());
        let roots = build_team_tree(directory.users());
        debug!(
            caller = %caller.user_id,
            roots = roots.len(),
            issues = issues.len(),
            "team tree built"
        );
        Ok(TeamTree { roots, issues })
    }

    async fn hot_lead_rows(
        &self,
        caller: CallerContext,
        range: DateRange,
    ) -> Result<Vec<HotLeadRow>, Error> {
        if caller.is_executive() {
            return Err(Error::forbidden("executives cannot export hot leads"));
        }
        let query = LeadQuery::all()
            .from_source(LeadSource::Facebook)
            .within(LeadTimeField::CreatedAt, range);
        let mut leads = self.query(&query).await?;
        leads.sort_by_key(|lead| Reverse((lead.created_at, lead.lead_id)));
        Ok(leads.into_iter().map(hot_lead_row).collect())
    }
}

#[cfg(test)]
#[path = "lead_reporting_tests.rs"]
mod tests;
