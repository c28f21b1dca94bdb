//! Runtime configuration loaded via OrthoConfig.
//!
//! Every value can come from CLI flags, `LEADS_*` environment variables or a
//! config file. Numeric knobs carry their defaults in the derive; optional
//! values fall back to the defaults exposed by the accessors below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v14.0";
const DEFAULT_FACEBOOK_TIMEOUT_SECS: u64 = 30;

/// Server and integration settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEADS")]
pub struct ServerSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL. Without it the server keeps leads in memory.
    pub database_url: Option<String>,
    /// Upper bound of the connection pool.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Versioned Graph API root.
    pub facebook_graph_url: Option<String>,
    /// Numeric id of the page whose lead-gen forms are synced.
    pub facebook_page_id: Option<u64>,
    /// Page access token. Without it lead-ads sync is disabled.
    pub facebook_access_token: Option<String>,
    /// Per-request timeout for Graph API calls.
    #[ortho_config(default = 30)]
    pub facebook_timeout_secs: u64,
}

/// Settings needed to talk to the Graph API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookSettings {
    pub graph_url: Url,
    pub page_id: String,
    pub access_token: String,
    pub timeout: Duration,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl ServerSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }

    /// Pool size; zero selects the default.
    pub fn db_max_connections(&self) -> u32 {
        match self.db_max_connections {
            0 => DEFAULT_DB_MAX_CONNECTIONS,
            max => max,
        }
    }

    /// Graph API settings, or `None` when no page or token is configured.
    ///
    /// # Errors
    ///
    /// Returns a message when the Graph API URL does not parse.
    pub fn facebook(&self) -> Result<Option<FacebookSettings>, String> {
        let (Some(page_id), Some(access_token)) = (
            self.facebook_page_id,
            non_blank(self.facebook_access_token.as_ref()),
        ) else {
            return Ok(None);
        };
        let raw_url = non_blank(self.facebook_graph_url.as_ref()).unwrap_or(DEFAULT_GRAPH_URL);
        let graph_url =
            Url::parse(raw_url).map_err(|err| format!("invalid facebook_graph_url {raw_url}: {err}"))?;
        Ok(Some(FacebookSettings {
            graph_url,
            page_id: page_id.to_string(),
            access_token: access_token.to_owned(),
            timeout: Duration::from_secs(match self.facebook_timeout_secs {
                0 => DEFAULT_FACEBOOK_TIMEOUT_SECS,
                secs => secs,
            }),
        }))
    }
}
