//! Append-only audit trail of caller-initiated disposition changes.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::disposition::Disposition;
use super::lead::{Lead, LeadId};
use super::user::{CallerContext, HierarchyLevel, UserId};

/// One recorded transition of a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub entry_id: Uuid,
    pub lead_id: LeadId,
    pub updated_at: DateTime<Utc>,
    pub updated_by: UserId,
    pub hierarchy_level: Option<HierarchyLevel>,
    pub disposition: Disposition,
    pub sub_disposition: String,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl HistoryEntry {
    /// Snapshot the lead's current outcome as written by `caller`.
    pub fn snapshot(lead: &Lead, caller: &CallerContext, now: DateTime<Utc>) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            lead_id: lead.lead_id,
            updated_at: now,
            updated_by: caller.user_id.clone(),
            hierarchy_level: caller.hierarchy_level,
            disposition: lead.disposition.clone(),
            sub_disposition: lead.sub_disposition.clone(),
            follow_up_date: lead.follow_up_date,
            remarks: lead.remarks.clone(),
        }
    }
}

/// Order entries newest first by write time.
pub fn sort_by_update_desc(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Order entries by follow-up date, latest first; undated entries go last.
pub fn sort_by_follow_up_desc(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| match (a.follow_up_date, b.follow_up_date) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
