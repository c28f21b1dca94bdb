//! Driving port for pulling new lead-ads submissions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Error;

/// Form that failed mid-run; the run carries on with the next form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSyncFailure {
    pub form_id: String,
    pub reason: String,
}

/// Totals of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAdsSyncReport {
    /// Active forms polled.
    pub forms: usize,
    /// Submissions newer than the previous watermark.
    pub fetched: usize,
    pub created: usize,
    /// Existing leads flagged as re-enquiries.
    pub reopened: usize,
    /// Submissions that could not be ingested.
    pub failed: usize,
    pub form_failures: Vec<FormSyncFailure>,
    /// Watermark stored for the next run.
    pub watermark: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadAdsSyncCommand: Send + Sync {
    async fn sync(&self) -> Result<LeadAdsSyncReport, Error>;
}
