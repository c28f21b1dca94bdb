//! Facebook Graph API lead-ads adapter.
//!
//! A thin HTTP implementation of the `LeadAdsSource` port.

mod dto;
mod http_source;

pub use http_source::{GraphApiConfig, GraphApiLeadAdsSource};
