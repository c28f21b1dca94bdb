//! Lead-ads integration trigger.
//!
//! ```text
//! POST /api/v1/integrations/facebook/sync
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::LeadAdsSyncReport;
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Per-form fetch failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormFailureResponse {
    pub form_id: String,
    pub reason: String,
}

/// Outcome of one sync run.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReportResponse {
    pub forms: usize,
    pub fetched: usize,
    pub created: usize,
    pub reopened: usize,
    pub failed: usize,
    pub form_failures: Vec<FormFailureResponse>,
    pub watermark: String,
}

impl From<LeadAdsSyncReport> for SyncReportResponse {
    fn from(report: LeadAdsSyncReport) -> Self {
        Self {
            forms: report.forms,
            fetched: report.fetched,
            created: report.created,
            reopened: report.reopened,
            failed: report.failed,
            form_failures: report
                .form_failures
                .into_iter()
                .map(|failure| FormFailureResponse {
                    form_id: failure.form_id,
                    reason: failure.reason,
                })
                .collect(),
            watermark: report.watermark.to_rfc3339(),
        }
    }
}

/// Pull new lead-ads submissions now.
#[utoipa::path(
    post,
    path = "/api/v1/integrations/facebook/sync",
    responses(
        (status = 200, description = "Sync report", body = SyncReportResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Super admins only", body = ErrorSchema),
        (status = 503, description = "Integration not configured or unreachable", body = ErrorSchema)
    ),
    tags = ["integrations"],
    operation_id = "syncFacebookLeads"
)]
#[post("/integrations/facebook/sync")]
pub async fn sync_facebook_leads(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<SyncReportResponse>> {
    if !caller.context().is_super_admin() {
        return Err(Error::forbidden("only super admins may trigger a lead sync"));
    }
    let sync = state
        .lead_ads_sync
        .as_ref()
        .ok_or_else(|| Error::service_unavailable("lead ads integration is not configured"))?;
    let report = sync.sync().await?;
    Ok(web::Json(report.into()))
}
