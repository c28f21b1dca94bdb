//! Backend entry-point: loads settings, applies migrations and serves the API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]

mod server;

use std::ffi::OsString;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use leads_backend::inbound::http::health::HealthState;
use leads_backend::outbound::facebook::GraphApiConfig;
use leads_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use leads_backend::settings::ServerSettings;
use ortho_config::OrthoConfig;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let mut args: Vec<OsString> = std::env::args_os().collect();
    if args.is_empty() {
        args.push(OsString::from("leads-backend"));
    }
    let settings = ServerSettings::load_from_iter(args)
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;

    let mut config = ServerConfig::new(settings.bind_addr());

    match settings.database_url() {
        Some(database_url) => {
            run_pending_migrations(database_url)
                .await
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            let pool = DbPool::new(
                PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
            )
            .await
            .map_err(|err| std::io::Error::other(err.to_string()))?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database URL configured; leads are kept in memory"),
    }

    match settings.facebook().map_err(std::io::Error::other)? {
        Some(facebook) => {
            info!(page_id = %facebook.page_id, "lead ads sync enabled");
            config = config.with_lead_ads(GraphApiConfig {
                base_url: facebook.graph_url,
                page_id: facebook.page_id,
                access_token: facebook.access_token,
                timeout: facebook.timeout,
            });
        }
        None => info!("lead ads sync disabled"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(bind_addr = %config.bind_addr(), "starting server");
    create_server(health_state, config)?.await
}
