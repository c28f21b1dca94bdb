//! HTTP server configuration object and helpers.

use leads_backend::outbound::facebook::GraphApiConfig;
use leads_backend::outbound::persistence::DbPool;
use std::net::SocketAddr;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) lead_ads: Option<GraphApiConfig>,
}

impl ServerConfig {
    /// Construct a configuration that keeps leads in memory.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            lead_ads: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, every driven port is served by its Diesel adapter.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Enable the lead-ads sync endpoint against one Facebook page.
    #[must_use]
    pub fn with_lead_ads(mut self, lead_ads: GraphApiConfig) -> Self {
        self.lead_ads = Some(lead_ads);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
