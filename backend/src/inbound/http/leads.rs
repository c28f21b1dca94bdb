//! Lead HTTP handlers.
//!
//! ```text
//! POST /api/v1/leads
//! POST /api/v1/leads/import
//! POST /api/v1/leads/query
//! POST /api/v1/leads/sales-panel
//! POST /api/v1/leads/assign
//! POST /api/v1/leads/search
//! POST /api/v1/leads/dashboard
//! POST /api/v1/leads/hot-export
//! GET  /api/v1/leads/allocated
//! GET  /api/v1/leads/member-counts
//! GET  /api/v1/leads/{leadId}
//! GET  /api/v1/leads/{leadId}/history
//! POST /api/v1/leads/{leadId}/disposition
//! ```
//!
//! The two fixed `GET` paths must be registered before `{leadId}`.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::domain::ports::{
    AssignLeadsRequest, DashboardRequest, ImportLeadsRequest, IngestOutcome,
    LeadsForCallerRequest, SalesPanelRequest, UpdateDispositionRequest,
};
use crate::domain::{Error, Lead};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_lead_id, parse_lead_ids, parse_optional_user_id, parse_user_id, require,
};

pub use super::leads_dto::{
    AssignLeadsBody, AssignmentReportResponse, DashboardRequestBody, DashboardResponse,
    DateRangeRequest, DispositionBody, HistoryEntryResponse, ImportLeadsBody,
    ImportReportResponse, LeadDetailResponse, LeadResponse, ManualLeadBody,
    MemberLeadCountsResponse, SalesPanelRequestBody, SearchBody,
};
use super::leads_dto::{
    LeadPath, history_list, lead_list, parse_disposition, parse_manual_lead, parse_search,
};

const LEAD_ID: FieldName = FieldName::new("leadId");
const LEAD_IDS: FieldName = FieldName::new("leadIds");
const SALES_MEMBER_ID: FieldName = FieldName::new("salesMemberId");
const MEMBER_ID: FieldName = FieldName::new("memberId");

fn duplicate_lead_error(lead: &Lead) -> Error {
    Error::conflict("a lead with this phone number already exists").with_details(json!({
        "leadId": lead.lead_id,
        "profileId": lead.profile_id,
    }))
}

/// Create a lead by hand and assign it.
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    request_body = ManualLeadBody,
    responses(
        (status = 201, description = "Lead created", body = LeadResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Sales executive not found", body = ErrorSchema),
        (status = 409, description = "Phone number already known", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "createManualLead"
)]
#[post("/leads")]
pub async fn create_lead(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<ManualLeadBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_manual_lead(caller.into_inner(), payload.into_inner())?;
    match state.ingestion.create_manual(request).await? {
        IngestOutcome::Created(lead) => Ok(HttpResponse::Created().json(LeadResponse::from(lead))),
        IngestOutcome::Duplicate(lead) => Err(duplicate_lead_error(&lead)),
    }
}

/// Import spreadsheet rows.
#[utoipa::path(
    post,
    path = "/api/v1/leads/import",
    request_body = ImportLeadsBody,
    responses(
        (status = 200, description = "Import report", body = ImportReportResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "importLeads"
)]
#[post("/leads/import")]
pub async fn import_leads(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<ImportLeadsBody>,
) -> ApiResult<web::Json<ImportReportResponse>> {
    let report = state
        .ingestion
        .import_rows(ImportLeadsRequest {
            caller: caller.into_inner(),
            rows: payload.into_inner().rows,
        })
        .await?;
    Ok(web::Json(report.into()))
}

/// Leads created in the window, scoped to the caller's level.
#[utoipa::path(
    post,
    path = "/api/v1/leads/query",
    request_body = DateRangeRequest,
    responses(
        (status = 200, description = "Scoped leads, newest first", body = Vec<LeadResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "fetchLeads"
)]
#[post("/leads/query")]
pub async fn query_leads(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<DateRangeRequest>,
) -> ApiResult<web::Json<Vec<LeadResponse>>> {
    let range = payload.into_inner().parse()?;
    let leads = state
        .reporting
        .leads_for_caller(LeadsForCallerRequest {
            caller: caller.into_inner(),
            range,
        })
        .await?;
    Ok(web::Json(lead_list(leads)))
}

/// Working list for a sales member and their team.
#[utoipa::path(
    post,
    path = "/api/v1/leads/sales-panel",
    request_body = SalesPanelRequestBody,
    responses(
        (status = 200, description = "Sales panel leads", body = Vec<LeadResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getSalesPanelData"
)]
#[post("/leads/sales-panel")]
pub async fn sales_panel(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<SalesPanelRequestBody>,
) -> ApiResult<web::Json<Vec<LeadResponse>>> {
    let SalesPanelRequestBody { range, my_data } = payload.into_inner();
    let leads = state
        .reporting
        .sales_panel(SalesPanelRequest {
            caller: caller.into_inner(),
            range: range.parse()?,
            my_data,
        })
        .await?;
    Ok(web::Json(lead_list(leads)))
}

/// Assign leads to a sales member.
#[utoipa::path(
    post,
    path = "/api/v1/leads/assign",
    request_body = AssignLeadsBody,
    responses(
        (status = 200, description = "Assignment report", body = AssignmentReportResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller may not assign leads", body = ErrorSchema),
        (status = 404, description = "Sales member not found", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "assignLeads"
)]
#[post("/leads/assign")]
pub async fn assign_leads(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<AssignLeadsBody>,
) -> ApiResult<web::Json<AssignmentReportResponse>> {
    let AssignLeadsBody {
        lead_ids,
        sales_member_id,
    } = payload.into_inner();
    let request = AssignLeadsRequest {
        caller: caller.into_inner(),
        lead_ids: parse_lead_ids(&lead_ids, LEAD_IDS)?,
        sales_member_id: parse_user_id(require(sales_member_id, SALES_MEMBER_ID)?, SALES_MEMBER_ID)?,
    };
    let report = state.assignment.assign(request).await?;
    Ok(web::Json(report.into()))
}

/// Find leads by phone, company, profile id or lead id.
#[utoipa::path(
    post,
    path = "/api/v1/leads/search",
    request_body = SearchBody,
    responses(
        (status = 200, description = "Matching leads", body = Vec<LeadResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "searchLeads"
)]
#[post("/leads/search")]
pub async fn search_leads(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<SearchBody>,
) -> ApiResult<web::Json<Vec<LeadResponse>>> {
    let search = parse_search(payload.into_inner())?;
    let leads = state.reporting.search(caller.into_inner(), search).await?;
    Ok(web::Json(lead_list(leads)))
}

/// Recently updated leads of the caller's team with their history.
#[utoipa::path(
    post,
    path = "/api/v1/leads/dashboard",
    request_body = DashboardRequestBody,
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Member outside the caller's team", body = ErrorSchema),
        (status = 404, description = "Member not found", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getDataForDashboard"
)]
#[post("/leads/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<DashboardRequestBody>,
) -> ApiResult<web::Json<DashboardResponse>> {
    let DashboardRequestBody { range, member_id } = payload.into_inner();
    let request = DashboardRequest {
        caller: caller.into_inner(),
        range: range.parse()?,
        member_id: parse_optional_user_id(member_id, MEMBER_ID)?,
    };
    let dashboard = state.reporting.dashboard(request).await?;
    Ok(web::Json(dashboard.into()))
}

/// Facebook leads created in the window as export rows.
#[utoipa::path(
    post,
    path = "/api/v1/leads/hot-export",
    request_body = DateRangeRequest,
    responses(
        (status = 200, description = "Export rows keyed by column", body = Vec<BTreeMap<String, String>>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller may not export", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "exportHotLeads"
)]
#[post("/leads/hot-export")]
pub async fn hot_export(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<DateRangeRequest>,
) -> ApiResult<web::Json<Vec<BTreeMap<String, String>>>> {
    let range = payload.into_inner().parse()?;
    let rows = state
        .reporting
        .hot_lead_rows(caller.into_inner(), range)
        .await?;
    Ok(web::Json(rows))
}

/// Every lead assigned to the caller's team.
#[utoipa::path(
    get,
    path = "/api/v1/leads/allocated",
    responses(
        (status = 200, description = "Allocated leads", body = Vec<LeadResponse>),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getAllAllocatedLeads"
)]
#[get("/leads/allocated")]
pub async fn allocated_leads(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<Vec<LeadResponse>>> {
    let leads = state.reporting.allocated_leads(caller.into_inner()).await?;
    Ok(web::Json(lead_list(leads)))
}

/// Lead totals per team member.
#[utoipa::path(
    get,
    path = "/api/v1/leads/member-counts",
    responses(
        (status = 200, description = "Per-member counts", body = Vec<MemberLeadCountsResponse>),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getUpdatedLeadsCount"
)]
#[get("/leads/member-counts")]
pub async fn member_counts(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<Vec<MemberLeadCountsResponse>>> {
    let counts = state
        .reporting
        .member_lead_counts(caller.into_inner())
        .await?;
    Ok(web::Json(counts.into_iter().map(Into::into).collect()))
}

/// One lead with its follow-up history.
#[utoipa::path(
    get,
    path = "/api/v1/leads/{leadId}",
    params(("leadId" = u64, Path, description = "Lead identifier")),
    responses(
        (status = 200, description = "Lead detail", body = LeadDetailResponse),
        (status = 400, description = "Invalid lead id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Lead not found", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getLeadDetail"
)]
#[get("/leads/{leadId}")]
pub async fn lead_detail(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<LeadPath>,
) -> ApiResult<web::Json<LeadDetailResponse>> {
    let lead_id = parse_lead_id(&path.lead_id, LEAD_ID)?;
    let detail = state
        .reporting
        .lead_detail(caller.into_inner(), lead_id)
        .await?;
    Ok(web::Json(detail.into()))
}

/// History of one lead, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/leads/{leadId}/history",
    params(("leadId" = u64, Path, description = "Lead identifier")),
    responses(
        (status = 200, description = "History entries", body = Vec<HistoryEntryResponse>),
        (status = 400, description = "Invalid lead id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Lead not found", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "getLeadHistory"
)]
#[get("/leads/{leadId}/history")]
pub async fn lead_history(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<LeadPath>,
) -> ApiResult<web::Json<Vec<HistoryEntryResponse>>> {
    let lead_id = parse_lead_id(&path.lead_id, LEAD_ID)?;
    let entries = state
        .reporting
        .lead_history(caller.into_inner(), lead_id)
        .await?;
    Ok(web::Json(history_list(entries)))
}

/// Record a call outcome.
#[utoipa::path(
    post,
    path = "/api/v1/leads/{leadId}/disposition",
    params(("leadId" = u64, Path, description = "Lead identifier")),
    request_body = DispositionBody,
    responses(
        (status = 200, description = "Updated lead", body = LeadResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lead belongs to another executive", body = ErrorSchema),
        (status = 404, description = "Lead not found", body = ErrorSchema)
    ),
    tags = ["leads"],
    operation_id = "updateDisposition"
)]
#[post("/leads/{leadId}/disposition")]
pub async fn update_disposition(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<LeadPath>,
    payload: web::Json<DispositionBody>,
) -> ApiResult<web::Json<LeadResponse>> {
    let request = UpdateDispositionRequest {
        caller: caller.into_inner(),
        lead_id: parse_lead_id(&path.lead_id, LEAD_ID)?,
        update: parse_disposition(payload.into_inner())?,
    };
    let lead = state.disposition.update_disposition(request).await?;
    Ok(web::Json(lead.into()))
}

#[cfg(test)]
#[path = "leads_tests.rs"]
mod tests;
