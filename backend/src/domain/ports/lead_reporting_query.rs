//! Driving port for scoped lead reads and rollups.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    CallerContext, DateRange, Error, HierarchyIssue, HierarchyLevel, HistoryEntry, Lead, LeadId,
    LeadSearch, StaffUser, TeamNode, UserId,
};

/// Leads visible to the caller, filtered by creation date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadsForCallerRequest {
    pub caller: CallerContext,
    pub range: DateRange,
}

/// Working list of the caller's team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesPanelRequest {
    pub caller: CallerContext,
    pub range: DateRange,
    /// Ignore dates, list every owned lead in disposition order.
    pub my_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub caller: CallerContext,
    /// Filters on `updatedAt`.
    pub range: DateRange,
    /// Narrow to one team member; managers expand to their subordinates.
    pub member_id: Option<UserId>,
}

/// History entry with the author's display name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHistoryEntry {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub updated_by_name: String,
}

/// Lead with its full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    pub lead: Lead,
    /// Latest follow-up first; undated entries last.
    pub history: Vec<ResolvedHistoryEntry>,
    /// Follow-up date of the second entry in `history`.
    pub last_call_back_date: Option<DateTime<Utc>>,
}

/// Compact staff projection used by dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: UserId,
    pub name: String,
    pub hierarchy_level: Option<HierarchyLevel>,
    pub senior_id: Option<UserId>,
}

impl From<&StaffUser> for MemberSummary {
    fn from(user: &StaffUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            hierarchy_level: user.hierarchy_level,
            senior_id: user.senior_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub history: Vec<ResolvedHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub leads: Vec<DashboardLead>,
    pub members: Vec<MemberSummary>,
}

/// Assigned-lead totals of one team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeadCounts {
    pub member: MemberSummary,
    pub total_assigned: usize,
    /// Disposition label to count.
    pub by_disposition: BTreeMap<String, usize>,
}

/// Org chart plus any malformed reporting lines found while building it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTree {
    pub roots: Vec<TeamNode>,
    pub issues: Vec<HierarchyIssue>,
}

/// Flat export row: column header to cell text.
pub type HotLeadRow = BTreeMap<String, String>;

/// Read-side use-cases. Every read is scoped by the caller's hierarchy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadReportingQuery: Send + Sync {
    async fn leads_for_caller(&self, request: LeadsForCallerRequest) -> Result<Vec<Lead>, Error>;

    async fn sales_panel(&self, request: SalesPanelRequest) -> Result<Vec<Lead>, Error>;

    async fn dashboard(&self, request: DashboardRequest) -> Result<Dashboard, Error>;

    async fn member_lead_counts(
        &self,
        caller: CallerContext,
    ) -> Result<Vec<MemberLeadCounts>, Error>;

    /// Every lead assigned to the caller's team, regardless of date.
    async fn allocated_leads(&self, caller: CallerContext) -> Result<Vec<Lead>, Error>;

    async fn lead_detail(&self, caller: CallerContext, lead_id: LeadId)
    -> Result<LeadDetail, Error>;

    /// History of one lead, newest write first.
    async fn lead_history(
        &self,
        caller: CallerContext,
        lead_id: LeadId,
    ) -> Result<Vec<ResolvedHistoryEntry>, Error>;

    async fn search(&self, caller: CallerContext, search: LeadSearch) -> Result<Vec<Lead>, Error>;

    async fn team_tree(&self, caller: CallerContext) -> Result<TeamTree, Error>;

    /// Facebook leads created in `range`, flattened for spreadsheet export.
    async fn hot_lead_rows(
        &self,
        caller: CallerContext,
        range: DateRange,
    ) -> Result<Vec<HotLeadRow>, Error>;
}
