//! Driving port for handing leads to executives.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{CallerContext, Error, LeadId, UserId};

/// Assign a set of leads to one executive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignLeadsRequest {
    pub caller: CallerContext,
    pub lead_ids: Vec<LeadId>,
    pub sales_member_id: UserId,
}

/// Lead that could not be assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFailure {
    pub lead_id: LeadId,
    pub reason: String,
}

/// Per-lead outcome of a bulk assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    pub assigned: Vec<LeadId>,
    pub failures: Vec<AssignmentFailure>,
}

/// Assignment use-case. Each lead is updated independently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadAssignmentCommand: Send + Sync {
    async fn assign(&self, request: AssignLeadsRequest) -> Result<AssignmentReport, Error>;
}
