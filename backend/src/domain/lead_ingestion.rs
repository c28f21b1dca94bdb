//! Lead ingestion service.
//!
//! Implements [`LeadIngestionCommand`]: phone-number deduplication, id
//! issuance, the lead-ads reopen path, manual creation and spreadsheet
//! imports. Every channel shares one admission path; manual creations store
//! their first history entry in the same write as the lead.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::disposition::{Disposition, NOT_AVAILABLE};
use super::lead::{LeadDraft, LeadSource, PhoneNumber, field};
use super::lead_import::draft_from_row;
use super::name_directory::NameDirectory;
use super::ports::{
    ImportDuplicate, ImportFailure, ImportLeadsRequest, ImportReport, IngestOutcome,
    LeadIngestionCommand, LeadRepository, LeadRepositoryError, LeadSequence, ManualLeadRequest,
    StaffDirectory,
};
use super::store_errors::{map_lead_repository_error, map_sequence_error, map_staff_error};
use super::{CallerContext, Error, ErrorCode, HistoryEntry, Lead};

const MANUAL_AD_TYPE: &str = "manual";

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn or_na(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// Lead creation service shared by every ingestion channel.
pub struct LeadIngestionService<L, S, D> {
    leads: Arc<L>,
    sequence: Arc<S>,
    staff: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<L, S, D> LeadIngestionService<L, S, D> {
    /// Wire the service to its lead store, id sequence and staff roster.
    pub fn new(leads: Arc<L>, sequence: Arc<S>, staff: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            leads,
            sequence,
            staff,
            clock,
        }
    }
}

impl<L, S, D> LeadIngestionService<L, S, D>
where
    L: LeadRepository,
    S: LeadSequence,
    D: StaffDirectory,
{
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Lead>, Error> {
        self.leads
            .find_by_phone(phone)
            .await
            .map_err(map_lead_repository_error)
    }

    /// Resolve a phone collision. Lead-ads submissions reopen the lead;
    /// every other source leaves it untouched.
    async fn handle_duplicate(
        &self,
        mut existing: Lead,
        source: LeadSource,
    ) -> Result<IngestOutcome, Error> {
        if source == LeadSource::Facebook {
            existing.reopen_for_reenquiry(self.clock.utc());
            self.leads
                .save(&existing)
                .await
                .map_err(map_lead_repository_error)?;
            info!(lead_id = %existing.lead_id, "lead reopened by re-enquiry");
        }
        Ok(IngestOutcome::Duplicate(existing))
    }

    /// Deduplicate and store `draft`. With an `author`, the lead and its
    /// first history entry are written together.
    async fn admit(
        &self,
        draft: LeadDraft,
        author: Option<&CallerContext>,
    ) -> Result<IngestOutcome, Error> {
        if let Some(phone) = draft.phone_number.as_ref() {
            if let Some(existing) = self.find_by_phone(phone).await? {
                return self.handle_duplicate(existing, draft.source).await;
            }
        }

        let lead_id = self
            .sequence
            .next_lead_id()
            .await
            .map_err(map_sequence_error)?;
        let now = self.clock.utc();
        let lead = Lead::from_draft(lead_id, draft, now);

        let stored = match author {
            Some(caller) => {
                let entry = HistoryEntry::snapshot(&lead, caller, now);
                self.leads.insert_with_history(&lead, &entry).await
            }
            None => self.leads.insert(&lead).await,
        };
        match stored {
            Ok(()) => {
                info!(
                    lead_id = %lead.lead_id,
                    profile_id = %lead.profile_id,
                    source = %lead.source,
                    "lead created"
                );
                Ok(IngestOutcome::Created(lead))
            }
            Err(LeadRepositoryError::DuplicatePhone { phone }) => {
                // Another ingestion claimed the phone between lookup and
                // insert; the issued id stays unused.
                warn!(lead_id = %lead_id, %phone, "phone claimed concurrently");
                let existing = match lead.phone_number.as_ref() {
                    Some(number) => self.find_by_phone(number).await?,
                    None => None,
                }
                .ok_or_else(|| Error::internal(format!("lead holding phone {phone} vanished")))?;
                self.handle_duplicate(existing, lead.source).await
            }
            Err(err) => Err(map_lead_repository_error(err)),
        }
    }

    fn manual_draft(
        &self,
        request: ManualLeadRequest,
        phone: PhoneNumber,
        directory: &NameDirectory,
    ) -> Result<LeadDraft, Error> {
        let now = self.clock.utc();
        let ManualLeadRequest {
            caller,
            created_at,
            phone: _,
            company_name,
            contact_name,
            email,
            city,
            looking_for,
            requirement,
            alternate_number,
            profile_score,
            remarks,
            disposition,
            sub_disposition,
            sales_executive,
            follow_up_date,
        } = request;

        let mut draft = LeadDraft::new(LeadSource::Manual, created_at.unwrap_or(now))
            .with_phone(phone)
            .with_field(field::LOOKING_FOR, or_na(looking_for))
            .with_field(field::REQUIREMENT, or_na(requirement))
            .with_field(field::ALTERNATE_NUMBER, or_na(alternate_number))
            .with_field(field::PROFILE_SCORE, or_na(profile_score))
            .with_field(field::AD_TYPE, MANUAL_AD_TYPE);
        draft.company_name = non_blank(company_name);
        draft.contact_name = non_blank(contact_name);
        draft.email = non_blank(email);
        draft.city = non_blank(city);
        draft.remarks = Some(or_na(remarks));
        draft.disposition = Disposition::from_label(&or_na(disposition));
        draft.sub_disposition = or_na(sub_disposition);
        draft.follow_up_date = follow_up_date;
        draft.created_by = Some(caller.user_id.clone());
        draft.assigned_by = Some(caller.user_id.clone());
        draft.assigned_by_name = directory.name_of(&caller.user_id).map(str::to_owned);
        draft.assigned_at = Some(now);

        if let Some(executive_id) = sales_executive {
            let executive = directory.find(&executive_id).ok_or_else(|| {
                Error::not_found(format!("sales executive {executive_id} does not exist"))
            })?;
            draft.sales_executive = Some(executive.id.clone());
            draft.sales_executive_name = Some(executive.name.clone());
        }
        Ok(draft)
    }

    async fn staff_snapshot(&self) -> Result<NameDirectory, Error> {
        let users = self.staff.list_all().await.map_err(map_staff_error)?;
        Ok(NameDirectory::new(users))
    }
}

#[async_trait]
impl<L, S, D> LeadIngestionCommand for LeadIngestionService<L, S, D>
where
    L: LeadRepository,
    S: LeadSequence,
    D: StaffDirectory,
{
    async fn ingest(&self, draft: LeadDraft) -> Result<IngestOutcome, Error> {
        self.admit(draft, None).await
    }

    async fn create_manual(&self, request: ManualLeadRequest) -> Result<IngestOutcome, Error> {
        let phone = PhoneNumber::new(&request.phone).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "phone", "code": "invalid_phone" }))
        })?;
        let caller = request.caller.clone();
        let directory = self.staff_snapshot().await?;
        let draft = self.manual_draft(request, phone, &directory)?;

        self.admit(draft, Some(&caller)).await
    }

    async fn import_rows(&self, request: ImportLeadsRequest) -> Result<ImportReport, Error> {
        let directory = self.staff_snapshot().await?;
        let now = self.clock.utc();
        let mut report = ImportReport::default();

        for (row, cells) in request.rows.iter().enumerate() {
            let draft = match draft_from_row(cells, &directory, &request.caller, now) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!(row, error = %err, "import row rejected");
                    report.failures.push(ImportFailure {
                        row,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            match self.ingest(draft).await {
                Ok(IngestOutcome::Created(_)) => report.created += 1,
                Ok(IngestOutcome::Duplicate(lead)) => report.duplicates.push(ImportDuplicate {
                    row,
                    lead_id: lead.lead_id,
                    profile_id: lead.profile_id,
                }),
                Err(err) if err.code() == ErrorCode::ServiceUnavailable => {
                    warn!(row, created = report.created, "lead import aborted");
                    return Err(err.with_details(json!({
                        "abortedAtRow": row,
                        "partialReport": report,
                    })));
                }
                Err(err) => {
                    warn!(row, error = %err, "import row failed");
                    report.failures.push(ImportFailure {
                        row,
                        reason: err.message().to_owned(),
                    });
                }
            }
        }

        info!(
            created = report.created,
            duplicates = report.duplicates.len(),
            failures = report.failures.len(),
            "lead import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "lead_ingestion_tests.rs"]
mod tests;
