//! Mapping of spreadsheet rows onto lead drafts.
//!
//! Rows arrive keyed by the column headers of the sales team's import
//! template. Cell formatting is the caller's concern; this module only
//! interprets the text.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::disposition::{Disposition, NOT_AVAILABLE};
use super::lead::{LeadDraft, LeadSource, LeadValidationError, PhoneNumber, field};
use super::name_directory::NameDirectory;
use super::ports::ImportRow;
use super::user::CallerContext;

/// Column headers of the import template.
pub mod column {
    pub const DATE: &str = "Date";
    pub const LOOKING_FOR: &str = "Looking For";
    pub const COMPANY_NAME: &str = "Company Name";
    pub const CONTACT_PERSON: &str = "Contact Person";
    pub const DEFAULT_NUMBER: &str = "Default Number";
    pub const CONTACT_NUMBER: &str = "Contact Number";
    pub const MAIL_ID: &str = "Mail Id";
    pub const CITY: &str = "City";
    pub const QUERY: &str = "Query";
    pub const DISPOSITION: &str = "Disposition";
    pub const SUB_DISPOSITION: &str = "Sub Disposition";
    pub const DATA_TAG: &str = "Data Tag";
    pub const USER_MAIL_ID: &str = "User Mail Id";
    pub const PROFILE_SCORE: &str = "profileScore";
    pub const REMARKS: &str = "remarks";
}

const DATE_FORMAT: &str = "%d-%m-%Y";
const MANUAL_AD_TYPE: &str = "manual";

/// Reasons a row cannot become a lead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportRowError {
    #[error("Date {0:?} is not in DD-MM-YYYY format")]
    MalformedDate(String),
    #[error("Default Number is invalid: {0}")]
    Phone(#[from] LeadValidationError),
}

fn cell<'a>(row: &'a ImportRow, header: &str) -> Option<&'a str> {
    row.get(header).map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn cell_or_na(row: &ImportRow, header: &str) -> String {
    cell(row, header).unwrap_or(NOT_AVAILABLE).to_owned()
}

fn cell_or_empty(row: &ImportRow, header: &str) -> String {
    cell(row, header).unwrap_or_default().to_owned()
}

/// Text cell for an optional core field; blanks and `NA` are absent.
fn optional_text(row: &ImportRow, header: &str) -> Option<String> {
    cell(row, header)
        .filter(|value| *value != NOT_AVAILABLE)
        .map(str::to_owned)
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ImportRowError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ImportRowError::MalformedDate(raw.to_owned()))
}

/// Interpret one spreadsheet row.
///
/// `User Mail Id` is looked up in `directory`; a match assigns the lead on
/// behalf of `caller`. Unknown addresses leave the lead unassigned.
pub fn draft_from_row(
    row: &ImportRow,
    directory: &NameDirectory,
    caller: &CallerContext,
    now: DateTime<Utc>,
) -> Result<LeadDraft, ImportRowError> {
    let created_at = cell(row, column::DATE).map(parse_date).transpose()?.unwrap_or(now);
    let phone = PhoneNumber::parse_optional(cell(row, column::DEFAULT_NUMBER))?;

    let mut draft = LeadDraft::new(LeadSource::ExcelImport, created_at)
        .with_field(field::LOOKING_FOR, cell_or_na(row, column::LOOKING_FOR))
        .with_field(field::REQUIREMENT, cell_or_empty(row, column::QUERY))
        .with_field(field::ALTERNATE_NUMBER, cell_or_na(row, column::CONTACT_NUMBER))
        .with_field(field::PROFILE_SCORE, cell_or_na(row, column::PROFILE_SCORE))
        .with_field(field::DATA_TAG, cell_or_na(row, column::DATA_TAG))
        .with_field(field::AD_TYPE, MANUAL_AD_TYPE);
    draft.phone_number = phone;
    draft.company_name = optional_text(row, column::COMPANY_NAME);
    draft.contact_name = optional_text(row, column::CONTACT_PERSON);
    draft.email = optional_text(row, column::MAIL_ID);
    draft.city = Some(cell_or_empty(row, column::CITY));
    draft.remarks = Some(cell_or_na(row, column::REMARKS));
    draft.disposition = Disposition::from_label(&cell_or_na(row, column::DISPOSITION));
    draft.sub_disposition = cell_or_na(row, column::SUB_DISPOSITION);
    draft.created_by = Some(caller.user_id.clone());

    if let Some(executive) = cell(row, column::USER_MAIL_ID)
        .and_then(|email| directory.find_by_email(email))
    {
        draft.sales_executive = Some(executive.id.clone());
        draft.sales_executive_name = Some(executive.name.clone());
        draft.assigned_by = Some(caller.user_id.clone());
        draft.assigned_by_name = directory.name_of(&caller.user_id).map(str::to_owned);
        draft.assigned_at = Some(now);
    }
    Ok(draft)
}
