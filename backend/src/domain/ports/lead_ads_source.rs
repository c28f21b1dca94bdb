//! Port for the external lead-ads platform.
//!
//! The source lists the lead-generation forms of one page and pages through
//! the submissions of each form, newest first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;

define_port_error! {
    /// Errors raised by lead-ads source adapters.
    pub enum LeadAdsSourceError {
        /// Request failed before a response was received.
        Transport { message: String } =>
            "lead ads transport failed: {message}",
        /// Request exceeded its deadline.
        Timeout { message: String } =>
            "lead ads request timed out: {message}",
        /// The platform throttled the caller.
        RateLimited { message: String } =>
            "lead ads request was rate limited: {message}",
        /// The platform rejected the request (bad token, unknown form).
        InvalidRequest { message: String } =>
            "lead ads request was rejected: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "lead ads response could not be decoded: {message}",
    }
}

/// Lead-generation form published on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadForm {
    pub id: String,
    pub name: String,
    pub status: String,
    pub locale: Option<String>,
}

impl LeadForm {
    /// Only active forms are polled.
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

/// One answered question of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceField {
    pub name: String,
    pub values: Vec<String>,
}

/// One form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLead {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub fields: Vec<SourceField>,
}

/// Page of submissions plus the cursor of the next (older) page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLeadPage {
    pub leads: Vec<SourceLead>,
    pub next_cursor: Option<String>,
}

/// Read access to lead-ads forms and submissions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadAdsSource: Send + Sync {
    async fn list_forms(&self) -> Result<Vec<LeadForm>, LeadAdsSourceError>;

    /// Fetch one page of `form_id` submissions, newest first. `cursor` is the
    /// value returned by the previous page.
    async fn fetch_leads(
        &self,
        form_id: &str,
        cursor: Option<String>,
    ) -> Result<SourceLeadPage, LeadAdsSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ACTIVE", true)]
    #[case("active", true)]
    #[case("ARCHIVED", false)]
    fn only_active_forms_are_polled(#[case] status: &str, #[case] expected: bool) {
        let form = LeadForm {
            id: "f1".to_owned(),
            name: "Spring campaign".to_owned(),
            status: status.to_owned(),
            locale: None,
        };
        assert_eq!(form.is_active(), expected);
    }
}
