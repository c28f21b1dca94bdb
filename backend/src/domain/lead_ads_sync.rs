//! Pulls new lead-ads submissions and feeds them through ingestion.
//!
//! One global watermark records the sync start time of the previous run.
//! Each active form is paged newest-first and paging stops at the first
//! submission created at or before the watermark. Deduplication by phone
//! number still guards against re-reads, so a failed run can simply be
//! repeated.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use super::lead::{LeadDraft, LeadFields, LeadSource, PhoneNumber, field};
use super::ports::{
    FormSyncFailure, IngestOutcome, LeadAdsSource, LeadAdsSourceError, LeadAdsSyncCommand,
    LeadAdsSyncReport, LeadForm, LeadIngestionCommand, LeadSyncStateRepository, SourceLead,
};
use super::store_errors::map_sync_state_error;
use super::{Error, ErrorCode};

/// Form question keys mapped onto core lead fields.
mod question {
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const PHONE_NUMBER: &str = "phone_number";
    pub const MOBILE_NUMBER: &str = "your_mobile_number";
    pub const COMPANY_NAME: &str = "company_name";
    pub const CITY: &str = "city";
}

const VALUE_SEPARATOR: &str = ", ";

fn map_source_error(err: LeadAdsSourceError) -> Error {
    match err {
        LeadAdsSourceError::Transport { message }
        | LeadAdsSourceError::Timeout { message }
        | LeadAdsSourceError::RateLimited { message } => {
            Error::service_unavailable(format!("lead ads platform unavailable: {message}"))
        }
        LeadAdsSourceError::InvalidRequest { message } | LeadAdsSourceError::Decode { message } => {
            Error::internal(format!("lead ads platform error: {message}"))
        }
    }
}

/// Flatten a submission into a lead draft.
///
/// Multi-valued answers are joined with `", "`. Answers without a core
/// counterpart stay in the extension bag, as does a phone number that does
/// not parse.
pub fn draft_from_submission(form: &LeadForm, submission: SourceLead) -> LeadDraft {
    let mut answers: LeadFields = submission
        .fields
        .into_iter()
        .map(|answer| (answer.name, answer.values.join(VALUE_SEPARATOR)))
        .collect();

    let phone = [question::PHONE_NUMBER, question::MOBILE_NUMBER]
        .into_iter()
        .find_map(|key| {
            let parsed = PhoneNumber::parse_optional(answers.get(key).map(String::as_str));
            parsed.ok().flatten().map(|phone| (key, phone))
        });
    let mut take = |key: &str| answers.remove(key).filter(|value| !value.trim().is_empty());

    let mut draft = LeadDraft::new(LeadSource::Facebook, submission.created_time);
    draft.contact_name = take(question::FULL_NAME);
    draft.email = take(question::EMAIL);
    draft.company_name = take(question::COMPANY_NAME);
    draft.city = take(question::CITY);
    if let Some((key, phone)) = phone {
        take(key);
        draft.phone_number = Some(phone);
    }

    draft.fields = answers;
    draft
        .with_field(field::AD_TYPE, form.name.clone())
        .with_field(field::FACEBOOK_LEAD_ID, submission.id)
}

/// Sync service over a lead-ads source.
pub struct LeadAdsSyncService<A, W, I> {
    source: Arc<A>,
    state: Arc<W>,
    ingestion: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<A, W, I> LeadAdsSyncService<A, W, I> {
    /// Wire the service to a lead-ads source, its sync state and ingestion.
    pub fn new(source: Arc<A>, state: Arc<W>, ingestion: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            state,
            ingestion,
            clock,
        }
    }
}

impl<A, W, I> LeadAdsSyncService<A, W, I>
where
    A: LeadAdsSource,
    W: LeadSyncStateRepository,
    I: LeadIngestionCommand,
{
    /// Submissions of one form created after `watermark`, newest first.
    async fn fresh_submissions(
        &self,
        form: &LeadForm,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<SourceLead>, LeadAdsSourceError> {
        let mut fresh = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.source.fetch_leads(&form.id, cursor).await?;
            let mut reached_watermark = false;
            for submission in page.leads {
                if submission.created_time <= watermark {
                    reached_watermark = true;
                    break;
                }
                fresh.push(submission);
            }
            match page.next_cursor {
                Some(next) if !reached_watermark => cursor = Some(next),
                _ => return Ok(fresh),
            }
        }
    }
}

#[async_trait]
impl<A, W, I> LeadAdsSyncCommand for LeadAdsSyncService<A, W, I>
where
    A: LeadAdsSource,
    W: LeadSyncStateRepository,
    I: LeadIngestionCommand,
{
    async fn sync(&self) -> Result<LeadAdsSyncReport, Error> {
        let started = self.clock.utc();
        let forms: Vec<LeadForm> = self
            .source
            .list_forms()
            .await
            .map_err(map_source_error)?
            .into_iter()
            .filter(LeadForm::is_active)
            .collect();
        self.state
            .upsert_forms(&forms, started)
            .await
            .map_err(map_sync_state_error)?;

        let watermark = match self
            .state
            .last_fetched()
            .await
            .map_err(map_sync_state_error)?
        {
            Some(watermark) => watermark,
            None => {
                info!(%started, "initialising lead ads watermark");
                self.state
                    .set_last_fetched(started)
                    .await
                    .map_err(map_sync_state_error)?;
                started
            }
        };

        let mut report = LeadAdsSyncReport {
            forms: forms.len(),
            fetched: 0,
            created: 0,
            reopened: 0,
            failed: 0,
            form_failures: Vec::new(),
            watermark: started,
        };

        for form in &forms {
            let submissions = match self.fresh_submissions(form, watermark).await {
                Ok(submissions) => submissions,
                Err(err) => {
                    warn!(form_id = %form.id, error = %err, "lead ads form fetch failed");
                    report.form_failures.push(FormSyncFailure {
                        form_id: form.id.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            report.fetched += submissions.len();

            for submission in submissions {
                let submission_id = submission.id.clone();
                match self
                    .ingestion
                    .ingest(draft_from_submission(form, submission))
                    .await
                {
                    Ok(IngestOutcome::Created(_)) => report.created += 1,
                    Ok(IngestOutcome::Duplicate(_)) => report.reopened += 1,
                    Err(err) if err.code() == ErrorCode::ServiceUnavailable => return Err(err),
                    Err(err) => {
                        warn!(
                            form_id = %form.id,
                            submission_id = %submission_id,
                            error = %err,
                            "lead ads submission not ingested"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        self.state
            .set_last_fetched(started)
            .await
            .map_err(map_sync_state_error)?;
        info!(
            forms = report.forms,
            fetched = report.fetched,
            created = report.created,
            reopened = report.reopened,
            failed = report.failed,
            form_failures = report.form_failures.len(),
            "lead ads sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "lead_ads_sync_tests.rs"]
mod tests;
