//! Pull new lead-ads submissions from one Facebook page into the lead store.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use leads_backend::domain::ports::LeadAdsSyncCommand;
use leads_backend::domain::{LeadAdsSyncService, LeadIngestionService};
use leads_backend::outbound::facebook::{GraphApiConfig, GraphApiLeadAdsSource};
use leads_backend::outbound::persistence::{
    DbPool, DieselLeadRepository, DieselLeadSequence, DieselLeadSyncStateRepository,
    DieselStaffDirectory, PoolConfig, run_pending_migrations,
};
use mockable::{Clock, DefaultClock};
use tokio::runtime::Builder;
use url::Url;

/// `sync-facebook-leads` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sync-facebook-leads",
    about = "Fetch lead-ads submissions created since the last run and ingest them",
    version
)]
struct CliArgs {
    /// Page whose lead-gen forms are read.
    #[arg(long = "page-id", value_name = "id")]
    page_id: String,
    /// Page access token. Falls back to `FB_ACCESS_TOKEN` when omitted.
    #[arg(long = "access-token", value_name = "token")]
    access_token: Option<String>,
    /// Versioned Graph API root.
    #[arg(
        long = "graph-url",
        value_name = "url",
        default_value = "https://graph.facebook.com/v14.0"
    )]
    graph_url: Url,
    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", value_name = "seconds", default_value_t = 30)]
    timeout_secs: u64,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_required(args.database_url, "--database-url", "DATABASE_URL")?;
    let access_token = resolve_required(args.access_token, "--access-token", "FB_ACCESS_TOKEN")?;

    run_pending_migrations(&database_url)
        .await
        .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let source = GraphApiLeadAdsSource::new(GraphApiConfig {
        base_url: args.graph_url,
        page_id: args.page_id,
        access_token,
        timeout: Duration::from_secs(args.timeout_secs),
    })
    .map_err(|error| io::Error::other(format!("create Graph API client: {error}")))?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ingestion = LeadIngestionService::new(
        Arc::new(DieselLeadRepository::new(pool.clone())),
        Arc::new(DieselLeadSequence::new(pool.clone())),
        Arc::new(DieselStaffDirectory::new(pool.clone())),
        clock.clone(),
    );
    let command = LeadAdsSyncService::new(
        Arc::new(source),
        Arc::new(DieselLeadSyncStateRepository::new(pool)),
        Arc::new(ingestion),
        clock,
    );

    let report = command
        .sync()
        .await
        .map_err(|error| io::Error::other(format!("lead sync failed: {error}")))?;

    println!("forms={}", report.forms);
    println!("fetched={}", report.fetched);
    println!("created={}", report.created);
    println!("reopened={}", report.reopened);
    println!("failed={}", report.failed);
    for failure in &report.form_failures {
        println!("form_failure={} {}", failure.form_id, failure.reason);
    }
    println!("watermark={}", report.watermark.to_rfc3339());

    Ok(())
}

fn resolve_required(explicit: Option<String>, flag: &str, env_var: &str) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{flag} must not be empty when provided"),
            ));
        }
        return Ok(value);
    }

    let from_env = env::var(env_var).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("value missing: set {flag} or {env_var}"),
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{env_var} must not be empty"),
        ));
    }
    Ok(from_env)
}
