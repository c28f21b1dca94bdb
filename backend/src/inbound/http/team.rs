//! Sales team tree.
//!
//! ```text
//! GET /api/v1/team
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TeamNode;
use crate::domain::ports::TeamTree;
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// One staff member and the people reporting to them.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamNodeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub hierarchy_level: Option<String>,
    pub senior_id: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub team_members: Vec<TeamNodeResponse>,
}

impl From<TeamNode> for TeamNodeResponse {
    fn from(node: TeamNode) -> Self {
        let user = node.user;
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            hierarchy_level: user.hierarchy_level.map(|level| level.as_str().to_owned()),
            senior_id: user.senior_id.map(String::from),
            team_members: node.team_members.into_iter().map(Self::from).collect(),
        }
    }
}

/// Team tree plus any reporting-line defects found while building it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamTreeResponse {
    pub roots: Vec<TeamNodeResponse>,
    #[schema(value_type = Vec<Object>)]
    pub issues: Vec<serde_json::Value>,
}

impl From<TeamTree> for TeamTreeResponse {
    fn from(tree: TeamTree) -> Self {
        Self {
            roots: tree.roots.into_iter().map(Into::into).collect(),
            issues: tree
                .issues
                .into_iter()
                .filter_map(|issue| serde_json::to_value(issue).ok())
                .collect(),
        }
    }
}

/// Active staff grouped under their seniors.
#[utoipa::path(
    get,
    path = "/api/v1/team",
    responses(
        (status = 200, description = "Team tree", body = TeamTreeResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Staff directory unavailable", body = ErrorSchema)
    ),
    tags = ["team"],
    operation_id = "getSalesTeamMembers"
)]
#[get("/team")]
pub async fn team_tree(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<TeamTreeResponse>> {
    let tree = state.reporting.team_tree(caller.into_inner()).await?;
    Ok(web::Json(tree.into()))
}
