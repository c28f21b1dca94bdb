//! Lead DTOs and request parsing helpers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::disposition::NOT_AVAILABLE;
use crate::domain::ports::{
    AssignmentFailure, AssignmentReport, Dashboard, DashboardLead, ImportDuplicate, ImportFailure,
    ImportReport, LeadDetail, ManualLeadRequest, MemberLeadCounts, MemberSummary,
    ResolvedHistoryEntry,
};
use crate::domain::{
    CallerContext, DateRange, Disposition, DispositionUpdate, Error, HistoryEntry, Lead,
    LeadSearch,
};
use crate::inbound::http::validation::{
    FieldName, parse_date_range, parse_optional_rfc3339_timestamp, parse_optional_user_id,
    require,
};

fn to_rfc3339(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|at| at.to_rfc3339())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LeadPath {
    pub(super) lead_id: String,
}

/// Inclusive date window. Either two `YYYY-MM-DD` dates or two RFC 3339
/// timestamps.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeRequest {
    #[schema(example = "2024-03-01")]
    pub start_date: Option<String>,
    #[schema(example = "2024-03-31")]
    pub end_date: Option<String>,
}

impl DateRangeRequest {
    pub(super) fn parse(self) -> Result<DateRange, Error> {
        parse_date_range(self.start_date, self.end_date)
    }
}

/// Request payload for the sales panel.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesPanelRequestBody {
    #[serde(flatten)]
    pub range: DateRangeRequest,
    /// Only the caller's own leads, ordered by disposition.
    #[serde(default)]
    pub my_data: bool,
}

/// Request payload for the dashboard.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequestBody {
    #[serde(flatten)]
    pub range: DateRangeRequest,
    pub member_id: Option<String>,
}

/// Request payload for manual lead creation.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualLeadBody {
    #[schema(example = "+919998887777")]
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub looking_for: Option<String>,
    pub requirement: Option<String>,
    pub alternate_number: Option<String>,
    pub profile_score: Option<String>,
    pub remarks: Option<String>,
    pub disposition: Option<String>,
    pub sub_disposition: Option<String>,
    pub sales_executive: Option<String>,
    pub follow_up_date: Option<String>,
    pub created_at: Option<String>,
}

const PHONE_NUMBER: FieldName = FieldName::new("phoneNumber");
const SALES_EXECUTIVE: FieldName = FieldName::new("salesExecutive");
const FOLLOW_UP_DATE: FieldName = FieldName::new("followUpDate");
const CREATED_AT: FieldName = FieldName::new("createdAt");
const DISPOSITION: FieldName = FieldName::new("disposition");

pub(super) fn parse_manual_lead(
    caller: CallerContext,
    body: ManualLeadBody,
) -> Result<ManualLeadRequest, Error> {
    let phone = require(body.phone_number, PHONE_NUMBER)?;
    let mut request = ManualLeadRequest::new(caller, phone);
    request.created_at = parse_optional_rfc3339_timestamp(body.created_at, CREATED_AT)?;
    request.follow_up_date = parse_optional_rfc3339_timestamp(body.follow_up_date, FOLLOW_UP_DATE)?;
    request.sales_executive = parse_optional_user_id(body.sales_executive, SALES_EXECUTIVE)?;
    request.company_name = body.company_name;
    request.contact_name = body.contact_name;
    request.email = body.email;
    request.city = body.city;
    request.looking_for = body.looking_for;
    request.requirement = body.requirement;
    request.alternate_number = body.alternate_number;
    request.profile_score = body.profile_score;
    request.remarks = body.remarks;
    request.disposition = body.disposition;
    request.sub_disposition = body.sub_disposition;
    Ok(request)
}

/// Request payload for spreadsheet row import. Each row maps header names
/// to cell text.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportLeadsBody {
    #[schema(max_items = 10_000)]
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Request payload for assigning leads to a sales member.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadsBody {
    #[serde(default)]
    #[schema(max_items = 1_000)]
    pub lead_ids: Vec<u64>,
    pub sales_member_id: Option<String>,
}

/// Request payload for recording a call outcome.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispositionBody {
    #[schema(example = "Call Back")]
    pub disposition: Option<String>,
    pub sub_disposition: Option<String>,
    pub follow_up_date: Option<String>,
    pub remarks: Option<String>,
}

pub(super) fn parse_disposition(body: DispositionBody) -> Result<DispositionUpdate, Error> {
    let disposition = require(body.disposition, DISPOSITION)?;
    Ok(DispositionUpdate {
        disposition: Disposition::from_label(&disposition),
        sub_disposition: body
            .sub_disposition
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
        follow_up_date: parse_optional_rfc3339_timestamp(body.follow_up_date, FOLLOW_UP_DATE)?,
        remarks: body.remarks,
    })
}

/// Request payload for lead search.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    /// One of `phone`, `companyName`, `profileId`, `leadId`.
    #[schema(example = "leadId")]
    pub field: Option<String>,
    #[schema(example = "1CD000042")]
    pub value: Option<String>,
}

pub(super) fn parse_search(body: SearchBody) -> Result<LeadSearch, Error> {
    let field = require(body.field, FieldName::new("field"))?;
    let value = require(body.value, FieldName::new("value"))?;
    LeadSearch::parse(&field, &value)
}

/// Response payload for a lead.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub lead_id: u64,
    #[schema(example = "1CD000042")]
    pub profile_id: String,
    pub phone_number: Option<String>,
    #[schema(example = "facebook")]
    pub source: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub remarks: Option<String>,
    pub disposition: String,
    pub sub_disposition: String,
    pub re_enquire: bool,
    pub sales_executive: Option<String>,
    pub sales_executive_name: Option<String>,
    pub assigned_by: Option<String>,
    pub assigned_by_name: Option<String>,
    pub assigned_at: Option<String>,
    pub follow_up_date: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    /// Source-specific extension fields.
    pub fields: BTreeMap<String, String>,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            lead_id: lead.lead_id.get(),
            profile_id: lead.profile_id.as_str().to_owned(),
            phone_number: lead.phone_number.map(String::from),
            source: lead.source.as_str().to_owned(),
            company_name: lead.company_name,
            contact_name: lead.contact_name,
            email: lead.email,
            city: lead.city,
            remarks: lead.remarks,
            disposition: lead.disposition.label().to_owned(),
            sub_disposition: lead.sub_disposition,
            re_enquire: lead.re_enquire,
            sales_executive: lead.sales_executive.map(String::from),
            sales_executive_name: lead.sales_executive_name,
            assigned_by: lead.assigned_by.map(String::from),
            assigned_by_name: lead.assigned_by_name,
            assigned_at: to_rfc3339(lead.assigned_at),
            follow_up_date: to_rfc3339(lead.follow_up_date),
            created_at: lead.created_at.to_rfc3339(),
            created_by: lead.created_by.map(String::from),
            updated_at: lead.updated_at.to_rfc3339(),
            fields: lead.fields,
        }
    }
}

pub(super) fn lead_list(leads: Vec<Lead>) -> Vec<LeadResponse> {
    leads.into_iter().map(LeadResponse::from).collect()
}

/// Response payload for one history entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub lead_id: u64,
    pub updated_at: String,
    pub updated_by: String,
    pub updated_by_name: String,
    pub hierarchy_level: Option<String>,
    pub disposition: String,
    pub sub_disposition: String,
    pub follow_up_date: Option<String>,
    pub remarks: Option<String>,
}

impl HistoryEntryResponse {
    fn new(entry: HistoryEntry, updated_by_name: String) -> Self {
        Self {
            lead_id: entry.lead_id.get(),
            updated_at: entry.updated_at.to_rfc3339(),
            updated_by: entry.updated_by.to_string(),
            updated_by_name,
            hierarchy_level: entry.hierarchy_level.map(|level| level.as_str().to_owned()),
            disposition: entry.disposition.label().to_owned(),
            sub_disposition: entry.sub_disposition,
            follow_up_date: to_rfc3339(entry.follow_up_date),
            remarks: entry.remarks,
        }
    }
}

impl From<ResolvedHistoryEntry> for HistoryEntryResponse {
    fn from(resolved: ResolvedHistoryEntry) -> Self {
        Self::new(resolved.entry, resolved.updated_by_name)
    }
}

pub(super) fn history_list(entries: Vec<ResolvedHistoryEntry>) -> Vec<HistoryEntryResponse> {
    entries.into_iter().map(HistoryEntryResponse::from).collect()
}

/// Response payload for the lead detail view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailResponse {
    pub lead: LeadResponse,
    pub history: Vec<HistoryEntryResponse>,
    pub last_call_back_date: Option<String>,
}

impl From<LeadDetail> for LeadDetailResponse {
    fn from(detail: LeadDetail) -> Self {
        Self {
            lead: detail.lead.into(),
            history: history_list(detail.history),
            last_call_back_date: to_rfc3339(detail.last_call_back_date),
        }
    }
}

/// Staff member summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub hierarchy_level: Option<String>,
    pub senior_id: Option<String>,
}

impl From<MemberSummary> for MemberResponse {
    fn from(member: MemberSummary) -> Self {
        Self {
            id: member.id.to_string(),
            name: member.name,
            hierarchy_level: member.hierarchy_level.map(|level| level.as_str().to_owned()),
            senior_id: member.senior_id.map(String::from),
        }
    }
}

/// A lead together with its resolved history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLeadResponse {
    #[serde(flatten)]
    pub lead: LeadResponse,
    pub history: Vec<HistoryEntryResponse>,
}

impl From<DashboardLead> for DashboardLeadResponse {
    fn from(row: DashboardLead) -> Self {
        Self {
            lead: row.lead.into(),
            history: history_list(row.history),
        }
    }
}

/// Response payload for the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub leads: Vec<DashboardLeadResponse>,
    pub members_data: Vec<MemberResponse>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            leads: dashboard.leads.into_iter().map(Into::into).collect(),
            members_data: dashboard.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-member lead totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeadCountsResponse {
    #[serde(flatten)]
    pub member: MemberResponse,
    pub total_assigned: usize,
    pub by_disposition: BTreeMap<String, usize>,
}

impl From<MemberLeadCounts> for MemberLeadCountsResponse {
    fn from(counts: MemberLeadCounts) -> Self {
        Self {
            member: counts.member.into(),
            total_assigned: counts.total_assigned,
            by_disposition: counts.by_disposition,
        }
    }
}

/// Duplicate row of an import.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportDuplicateResponse {
    pub row: usize,
    pub lead_id: u64,
    pub profile_id: String,
}

/// Row that could not be imported.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowFailureResponse {
    pub row: usize,
    pub reason: String,
}

/// Response payload for a spreadsheet import.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReportResponse {
    pub created: usize,
    pub duplicates: Vec<ImportDuplicateResponse>,
    pub failures: Vec<RowFailureResponse>,
}

impl From<ImportReport> for ImportReportResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            created: report.created,
            duplicates: report
                .duplicates
                .into_iter()
                .map(|ImportDuplicate { row, lead_id, profile_id }| ImportDuplicateResponse {
                    row,
                    lead_id: lead_id.get(),
                    profile_id: profile_id.as_str().to_owned(),
                })
                .collect(),
            failures: report
                .failures
                .into_iter()
                .map(|ImportFailure { row, reason }| RowFailureResponse { row, reason })
                .collect(),
        }
    }
}

/// Lead that could not be assigned.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFailureResponse {
    pub lead_id: u64,
    pub reason: String,
}

/// Response payload for an assignment batch.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReportResponse {
    pub assigned: Vec<u64>,
    pub failures: Vec<AssignmentFailureResponse>,
}

impl From<AssignmentReport> for AssignmentReportResponse {
    fn from(report: AssignmentReport) -> Self {
        Self {
            assigned: report.assigned.into_iter().map(|id| id.get()).collect(),
            failures: report
                .failures
                .into_iter()
                .map(|AssignmentFailure { lead_id, reason }| AssignmentFailureResponse {
                    lead_id: lead_id.get(),
                    reason,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, HierarchyLevel, LeadDraft, LeadId, LeadSource, PhoneNumber};
    use crate::test_support::{caller, fixture_now};
    use rstest::rstest;

    #[test]
    fn manual_lead_requires_a_phone_number() {
        let err = parse_manual_lead(
            caller("mgr", HierarchyLevel::Manager),
            ManualLeadBody::default(),
        )
        .expect_err("phone missing");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details()
                .and_then(|details| details.get("field"))
                .and_then(|value| value.as_str()),
            Some("phoneNumber")
        );
    }

    #[test]
    fn manual_lead_parses_optional_fields() {
        let body = ManualLeadBody {
            phone_number: Some("9998887777".to_owned()),
            sales_executive: Some("exec-1".to_owned()),
            follow_up_date: Some("2024-03-05T09:30:00Z".to_owned()),
            ..ManualLeadBody::default()
        };

        let request = parse_manual_lead(caller("mgr", HierarchyLevel::Manager), body)
            .expect("valid body");

        assert_eq!(request.phone, "9998887777");
        assert_eq!(request.sales_executive.map(String::from).as_deref(), Some("exec-1"));
        assert!(request.follow_up_date.is_some());
    }

    #[rstest]
    #[case(None, "NA")]
    #[case(Some(" "), "NA")]
    #[case(Some("Interested"), "Interested")]
    fn sub_disposition_defaults_to_placeholder(
        #[case] raw: Option<&str>,
        #[case] expected: &str,
    ) {
        let update = parse_disposition(DispositionBody {
            disposition: Some("Call Back".to_owned()),
            sub_disposition: raw.map(str::to_owned),
            ..DispositionBody::default()
        })
        .expect("valid update");

        assert_eq!(update.disposition, Disposition::CallBack);
        assert_eq!(update.sub_disposition, expected);
    }

    #[test]
    fn search_requires_field_and_value() {
        let err = parse_search(SearchBody {
            field: Some("leadId".to_owned()),
            value: None,
        })
        .expect_err("value missing");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn lead_response_renders_wire_values() {
        let draft = LeadDraft::new(LeadSource::Facebook, fixture_now())
            .with_phone(PhoneNumber::new("9998887777").expect("valid phone"))
            .with_field("adType", "Spring campaign");
        let lead = Lead::from_draft(LeadId::new(42), draft, fixture_now());

        let response = LeadResponse::from(lead);

        assert_eq!(response.profile_id, "1CD000042");
        assert_eq!(response.source, "facebook");
        assert_eq!(response.disposition, "NA");
        assert_eq!(response.created_at, "2024-03-04T10:00:00+00:00");
        assert_eq!(
            response.fields.get("adType").map(String::as_str),
            Some("Spring campaign")
        );
    }
}
