//! Reqwest-backed Graph API lead-ads source.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding into port records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::dto::{FormDto, GraphErrorEnvelopeDto, GraphPageDto, LeadDto};
use crate::domain::ports::{LeadAdsSource, LeadAdsSourceError, LeadForm, SourceLeadPage};

const PAGE_SIZE: &str = "100";
const FORM_FIELDS: &str = "id,name,status,locale";
const LEAD_FIELDS: &str = "id,created_time,field_data";
const USER_AGENT: &str = "leads-backend-lead-sync/0.1";

/// Connection settings for one Facebook page.
pub struct GraphApiConfig {
    /// Versioned Graph API root, e.g. `https://graph.facebook.com/v14.0`.
    pub base_url: Url,
    pub page_id: String,
    pub access_token: String,
    pub timeout: Duration,
}

/// Lead-ads source reading one page's lead-gen forms.
pub struct GraphApiLeadAdsSource {
    client: Client,
    base_url: Url,
    page_id: String,
    access_token: String,
}

impl GraphApiLeadAdsSource {
    /// Build an adapter with a reqwest client bounded by `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: GraphApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            page_id: config.page_id,
            access_token: config.access_token,
        })
    }

    fn endpoint(&self, node: &str, edge: &str) -> Result<Url, LeadAdsSourceError> {
        build_endpoint(&self.base_url, node, edge)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LeadAdsSourceError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|error| {
            LeadAdsSourceError::decode(format!("invalid Graph API payload: {error}"))
        })
    }
}

fn build_endpoint(base: &Url, node: &str, edge: &str) -> Result<Url, LeadAdsSourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| LeadAdsSourceError::invalid_request("Graph API base URL cannot take a path"))?
        .pop_if_empty()
        .push(node)
        .push(edge);
    Ok(url)
}

#[async_trait]
impl LeadAdsSource for GraphApiLeadAdsSource {
    async fn list_forms(&self) -> Result<Vec<LeadForm>, LeadAdsSourceError> {
        let mut url = self.endpoint(&self.page_id, "leadgen_forms")?;
        url.query_pairs_mut()
            .append_pair("fields", FORM_FIELDS)
            .append_pair("limit", PAGE_SIZE);
        let page: GraphPageDto<FormDto> = self.get_json(url).await?;
        Ok(page.into_forms())
    }

    async fn fetch_leads(
        &self,
        form_id: &str,
        cursor: Option<String>,
    ) -> Result<SourceLeadPage, LeadAdsSourceError> {
        let mut url = self.endpoint(form_id, "leads")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("fields", LEAD_FIELDS)
                .append_pair("limit", PAGE_SIZE);
            if let Some(after) = cursor.as_deref() {
                query.append_pair("after", after);
            }
        }
        let page: GraphPageDto<LeadDto> = self.get_json(url).await?;
        page.into_page().map_err(LeadAdsSourceError::decode)
    }
}

fn map_transport_error(error: reqwest::Error) -> LeadAdsSourceError {
    if error.is_timeout() {
        LeadAdsSourceError::timeout(error.to_string())
    } else {
        LeadAdsSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> LeadAdsSourceError {
    let graph_error = serde_json::from_slice::<GraphErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = match &graph_error {
        Some(error) if !error.message.is_empty() => {
            format!("status {}: {}", status.as_u16(), error.message)
        }
        _ => format!("status {}", status.as_u16()),
    };

    if graph_error.as_ref().is_some_and(|error| error.is_throttling()) {
        return LeadAdsSourceError::rate_limited(message);
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => LeadAdsSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LeadAdsSourceError::timeout(message)
        }
        _ if status.is_client_error() => LeadAdsSourceError::invalid_request(message),
        _ => LeadAdsSourceError::transport(message),
    }
}
