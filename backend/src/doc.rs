//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every lead, admin, team, integration and health
//! endpoint together with the error schema wrappers from
//! [`crate::inbound::http::schemas`]. Callers are identified by gateway
//! headers, described here as API-key security schemes.
//!
//! The generated document backs Swagger UI (debug builds) and is
//! exported via `cargo run --bin openapi-dump`.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Describe the identity headers set by the upstream gateway.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "GatewayUser",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-User-Id",
                "Authenticated staff member id, set by the gateway.",
            ))),
        );
        components.add_security_scheme(
            "GatewayHierarchyLevel",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-Hierarchy-Level",
                "Caller's hierarchy level: superAdmin, manager, teamLead or executive.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Leads backend API",
        description = "Lead intake, hierarchical assignment, dispositions and reporting.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("GatewayUser" = [], "GatewayHierarchyLevel" = [])),
    paths(
        crate::inbound::http::leads::create_lead,
        crate::inbound::http::leads::import_leads,
        crate::inbound::http::leads::query_leads,
        crate::inbound::http::leads::sales_panel,
        crate::inbound::http::leads::assign_leads,
        crate::inbound::http::leads::search_leads,
        crate::inbound::http::leads::dashboard,
        crate::inbound::http::leads::hot_export,
        crate::inbound::http::leads::allocated_leads,
        crate::inbound::http::leads::member_counts,
        crate::inbound::http::leads::lead_detail,
        crate::inbound::http::leads::lead_history,
        crate::inbound::http::leads::update_disposition,
        crate::inbound::http::admin::delete_leads,
        crate::inbound::http::admin::clear_assignments,
        crate::inbound::http::team::team_tree,
        crate::inbound::http::integrations::sync_facebook_leads,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "leads", description = "Lead intake, assignment and reporting"),
        (name = "admin", description = "Super-admin bulk operations"),
        (name = "team", description = "Sales team hierarchy"),
        (name = "integrations", description = "Lead-ads platform sync"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
