//! Driving port for recording call outcomes.

use async_trait::async_trait;

use crate::domain::{CallerContext, DispositionUpdate, Error, Lead, LeadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDispositionRequest {
    pub caller: CallerContext,
    pub lead_id: LeadId,
    pub update: DispositionUpdate,
}

/// Disposition use-case. Every successful update appends one history entry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadDispositionCommand: Send + Sync {
    async fn update_disposition(&self, request: UpdateDispositionRequest) -> Result<Lead, Error>;
}
