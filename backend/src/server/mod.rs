//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use leads_backend::Trace;
#[cfg(debug_assertions)]
use leads_backend::doc::ApiDoc;
use leads_backend::inbound::http::admin::{clear_assignments, delete_leads};
use leads_backend::inbound::http::health::{HealthState, live, ready};
use leads_backend::inbound::http::integrations::sync_facebook_leads;
use leads_backend::inbound::http::leads::{
    allocated_leads, assign_leads, create_lead, dashboard, hot_export, import_leads, lead_detail,
    lead_history, member_counts, query_leads, sales_panel, search_leads, update_disposition,
};
use leads_backend::inbound::http::state::HttpState;
use leads_backend::inbound::http::team::team_tree;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    // Literal segments must precede `/leads/{leadId}`.
    let api = web::scope("/api/v1")
        .service(create_lead)
        .service(import_leads)
        .service(query_leads)
        .service(sales_panel)
        .service(assign_leads)
        .service(search_leads)
        .service(dashboard)
        .service(hot_export)
        .service(allocated_leads)
        .service(member_counts)
        .service(lead_history)
        .service(update_disposition)
        .service(lead_detail)
        .service(delete_leads)
        .service(clear_assignments)
        .service(team_tree)
        .service(sync_facebook_leads);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] with the bind address and optional adapters.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket, building the
/// lead-ads client or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    mut config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(build_http_state(&mut config)?);
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
