//! Super-admin bulk operations.
//!
//! ```text
//! POST /api/v1/admin/leads/delete
//! POST /api/v1/admin/leads/clear-assignments
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_lead_ids};

/// Request payload for bulk deletion.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLeadsBody {
    #[serde(default)]
    #[schema(max_items = 10_000)]
    pub lead_ids: Vec<u64>,
}

/// Number of rows a bulk operation touched.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkResultResponse {
    pub affected: u64,
}

/// Delete leads in one all-or-nothing batch.
#[utoipa::path(
    post,
    path = "/api/v1/admin/leads/delete",
    request_body = DeleteLeadsBody,
    responses(
        (status = 200, description = "Leads deleted", body = BulkResultResponse),
        (status = 400, description = "Empty id list", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Super admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deleteLeads"
)]
#[post("/admin/leads/delete")]
pub async fn delete_leads(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<DeleteLeadsBody>,
) -> ApiResult<web::Json<BulkResultResponse>> {
    let lead_ids = parse_lead_ids(&payload.lead_ids, FieldName::new("leadIds"))?;
    let affected = state
        .administration
        .delete_leads(caller.into_inner(), lead_ids)
        .await?;
    Ok(web::Json(BulkResultResponse { affected }))
}

/// Remove the sales executive from every lead.
#[utoipa::path(
    post,
    path = "/api/v1/admin/leads/clear-assignments",
    responses(
        (status = 200, description = "Assignments cleared", body = BulkResultResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Super admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "clearAssignments"
)]
#[post("/admin/leads/clear-assignments")]
pub async fn clear_assignments(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<BulkResultResponse>> {
    let affected = state
        .administration
        .clear_assignments(caller.into_inner())
        .await?;
    Ok(web::Json(BulkResultResponse { affected }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, HierarchyLevel, LeadId};
    use crate::inbound::http::test_utils::{MockPorts, as_caller};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::json;

    async fn call(ports: MockPorts, request: test::TestRequest) -> StatusCode {
        let app = test::init_service(
            App::new().app_data(ports.into_state()).service(
                web::scope("/api/v1")
                    .service(delete_leads)
                    .service(clear_assignments),
            ),
        )
        .await;
        test::call_service(&app, request.to_request()).await.status()
    }

    #[actix_web::test]
    async fn delete_forwards_ids() {
        let mut ports = MockPorts::default();
        ports
            .administration
            .expect_delete_leads()
            .withf(|_, ids| ids == &[LeadId::new(1), LeadId::new(2)])
            .times(1)
            .return_once(|_, _| Ok(2));
        let request = as_caller(
            test::TestRequest::post().uri("/api/v1/admin/leads/delete"),
            "admin",
            HierarchyLevel::SuperAdmin,
        )
        .set_json(json!({ "leadIds": [1, 2] }));

        assert_eq!(call(ports, request).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn non_admins_are_forbidden() {
        let mut ports = MockPorts::default();
        ports
            .administration
            .expect_clear_assignments()
            .return_once(|_| Err(Error::forbidden("only super admins may clear assignments")));
        let request = as_caller(
            test::TestRequest::post().uri("/api/v1/admin/leads/clear-assignments"),
            "mgr",
            HierarchyLevel::Manager,
        );

        assert_eq!(call(ports, request).await, StatusCode::FORBIDDEN);
    }
}
