//! Driving port for creating leads.
//!
//! Every channel funnels through [`LeadIngestionCommand::ingest`], which owns
//! deduplication by phone number and id issuance.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CallerContext, Error, Lead, LeadDraft, LeadId, ProfileId, UserId};

/// Result of ingesting one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new lead was stored.
    Created(Lead),
    /// The phone number already belonged to this lead. For ad re-enquiries
    /// the lead has been reopened.
    Duplicate(Lead),
}

impl IngestOutcome {
    pub fn lead(&self) -> &Lead {
        match self {
            Self::Created(lead) | Self::Duplicate(lead) => lead,
        }
    }

    pub fn into_lead(self) -> Lead {
        match self {
            Self::Created(lead) | Self::Duplicate(lead) => lead,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Lead keyed in by a staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualLeadRequest {
    pub caller: CallerContext,
    /// Enquiry date; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
    pub phone: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub looking_for: Option<String>,
    pub requirement: Option<String>,
    pub alternate_number: Option<String>,
    pub profile_score: Option<String>,
    pub remarks: Option<String>,
    pub disposition: Option<String>,
    pub sub_disposition: Option<String>,
    pub sales_executive: Option<UserId>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl ManualLeadRequest {
    /// Request with only the mandatory phone number set.
    pub fn new(caller: CallerContext, phone: impl Into<String>) -> Self {
        Self {
            caller,
            created_at: None,
            phone: phone.into(),
            company_name: None,
            contact_name: None,
            email: None,
            city: None,
            looking_for: None,
            requirement: None,
            alternate_number: None,
            profile_score: None,
            remarks: None,
            disposition: None,
            sub_disposition: None,
            sales_executive: None,
            follow_up_date: None,
        }
    }
}

/// One spreadsheet row keyed by column header.
pub type ImportRow = BTreeMap<String, String>;

/// Bulk spreadsheet import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLeadsRequest {
    pub caller: CallerContext,
    pub rows: Vec<ImportRow>,
}

/// Row whose phone number already belonged to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDuplicate {
    /// Zero-based row position in the request.
    pub row: usize,
    pub lead_id: LeadId,
    pub profile_id: ProfileId,
}

/// Row that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub row: usize,
    pub reason: String,
}

/// Per-row outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: usize,
    pub duplicates: Vec<ImportDuplicate>,
    pub failures: Vec<ImportFailure>,
}

/// Lead creation use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadIngestionCommand: Send + Sync {
    /// Deduplicate and store one lead from any channel.
    async fn ingest(&self, draft: LeadDraft) -> Result<IngestOutcome, Error>;

    /// Create a lead on behalf of a staff member and record its first
    /// history entry.
    async fn create_manual(&self, request: ManualLeadRequest) -> Result<IngestOutcome, Error>;

    /// Ingest spreadsheet rows, collecting per-row failures.
    async fn import_rows(&self, request: ImportLeadsRequest) -> Result<ImportReport, Error>;
}
