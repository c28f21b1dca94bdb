//! Lead records, their identifiers, and the transitions applied to them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::disposition::{Disposition, HOT_LEAD, NOT_AVAILABLE};
use super::user::{StaffUser, UserId};

/// Prefix of the human-facing profile identifier.
pub const PROFILE_ID_PREFIX: &str = "1CD";

/// Prefix of the storage key derived from a lead id.
pub const STORAGE_KEY_PREFIX: &str = "1click";

const PROFILE_ID_DIGITS: usize = 6;

/// Open-ended, source-specific lead attributes.
pub type LeadFields = BTreeMap<String, String>;

/// Well-known keys of [`LeadFields`].
pub mod field {
    pub const LOOKING_FOR: &str = "lookingFor";
    pub const REQUIREMENT: &str = "requirement";
    pub const ALTERNATE_NUMBER: &str = "alternateNumber";
    pub const PROFILE_SCORE: &str = "profileScore";
    pub const DATA_TAG: &str = "dataTag";
    pub const AD_TYPE: &str = "adType";
    pub const FACEBOOK_LEAD_ID: &str = "facebookLeadId";
}

/// Validation errors for lead identity values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadValidationError {
    #[error("lead id must be a positive integer, got {0:?}")]
    InvalidLeadId(String),
    #[error("phone number must not be empty")]
    EmptyPhone,
    #[error("phone number {0:?} must contain 5 to 15 digits")]
    MalformedPhone(String),
    #[error("unknown lead source: {0}")]
    UnknownSource(String),
}

/// Integer lead identifier issued by the lead sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LeadId(u64);

impl LeadId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Human-facing identifier derived from this id.
    pub fn profile_id(self) -> ProfileId {
        ProfileId::from_lead_id(self)
    }

    /// Storage key derived from this id, e.g. `1click42`.
    pub fn storage_key(self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.0)
    }

    /// Recover a lead id from user-entered text.
    ///
    /// Accepts a bare integer or anything ending in a profile identifier,
    /// reading the digits after the last `1CD`.
    ///
    /// # Examples
    /// ```
    /// use leads_backend::domain::LeadId;
    ///
    /// assert_eq!(LeadId::parse_lenient("1CD000042").map(LeadId::get), Ok(42));
    /// assert_eq!(LeadId::parse_lenient("42").map(LeadId::get), Ok(42));
    /// ```
    pub fn parse_lenient(raw: &str) -> Result<Self, LeadValidationError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .rsplit_once(PROFILE_ID_PREFIX)
            .map_or(trimmed, |(_, tail)| tail);
        digits.parse().map_err(|_| LeadValidationError::InvalidLeadId(raw.to_owned()))
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LeadId {
    type Err = LeadValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(LeadValidationError::InvalidLeadId(s.to_owned())),
        }
    }
}

/// `1CD` followed by the zero-padded lead id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// # Examples
    /// ```
    /// use leads_backend::domain::{LeadId, ProfileId};
    ///
    /// assert_eq!(ProfileId::from_lead_id(LeadId::new(1)).as_str(), "1CD000001");
    /// ```
    pub fn from_lead_id(id: LeadId) -> Self {
        Self(format!(
            "{PROFILE_ID_PREFIX}{:0width$}",
            id.get(),
            width = PROFILE_ID_DIGITS
        ))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplication key of a lead.
///
/// Spaces, dashes, dots and parentheses are stripped so that cosmetic
/// formatting differences do not defeat deduplication.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// # Examples
    /// ```
    /// use leads_backend::domain::PhoneNumber;
    ///
    /// let phone = PhoneNumber::new("+91 99988-87777").expect("valid phone");
    /// assert_eq!(phone.as_str(), "+919998887777");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LeadValidationError> {
        let raw = raw.as_ref();
        let compact: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();
        if compact.is_empty() {
            return Err(LeadValidationError::EmptyPhone);
        }
        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let valid = digits.chars().all(|c| c.is_ascii_digit()) && (5..=15).contains(&digits.len());
        if !valid {
            return Err(LeadValidationError::MalformedPhone(raw.to_owned()));
        }
        Ok(Self(compact))
    }

    /// Parse optional input where blanks and the `NA` placeholder mean absent.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, LeadValidationError> {
        match raw.map(str::trim) {
            None | Some("") | Some(NOT_AVAILABLE) => Ok(None),
            Some(value) => Self::new(value).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = LeadValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

/// Channel a lead arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Facebook,
    Manual,
    ExcelImport,
}

impl LeadSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Manual => "manual",
            Self::ExcelImport => "excel_import",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = LeadValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "facebook" => Ok(Self::Facebook),
            "manual" => Ok(Self::Manual),
            "excel_import" => Ok(Self::ExcelImport),
            other => Err(LeadValidationError::UnknownSource(other.to_owned())),
        }
    }
}

/// Lead content before an id has been issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadDraft {
    pub source: LeadSource,
    pub phone_number: Option<PhoneNumber>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub remarks: Option<String>,
    pub disposition: Disposition,
    pub sub_disposition: String,
    pub fields: LeadFields,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub sales_executive: Option<UserId>,
    pub sales_executive_name: Option<String>,
    pub assigned_by: Option<UserId>,
    pub assigned_by_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl LeadDraft {
    /// Unassigned draft with placeholder disposition values.
    pub fn new(source: LeadSource, created_at: DateTime<Utc>) -> Self {
        Self {
            source,
            phone_number: None,
            company_name: None,
            contact_name: None,
            email: None,
            city: None,
            remarks: None,
            disposition: Disposition::NotAvailable,
            sub_disposition: NOT_AVAILABLE.to_owned(),
            fields: LeadFields::new(),
            created_at,
            created_by: None,
            sales_executive: None,
            sales_executive_name: None,
            assigned_by: None,
            assigned_by_name: None,
            assigned_at: None,
            follow_up_date: None,
        }
    }

    pub fn with_phone(mut self, phone: PhoneNumber) -> Self {
        self.phone_number = Some(phone);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A prospective customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub lead_id: LeadId,
    pub profile_id: ProfileId,
    pub phone_number: Option<PhoneNumber>,
    pub source: LeadSource,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub remarks: Option<String>,
    pub disposition: Disposition,
    pub sub_disposition: String,
    pub re_enquire: bool,
    pub sales_executive: Option<UserId>,
    pub sales_executive_name: Option<String>,
    pub assigned_by: Option<UserId>,
    pub assigned_by_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: LeadFields,
}

/// New outcome recorded by an executive after contacting a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionUpdate {
    pub disposition: Disposition,
    pub sub_disposition: String,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl Lead {
    /// Materialise a draft under a freshly issued id.
    pub fn from_draft(lead_id: LeadId, draft: LeadDraft, now: DateTime<Utc>) -> Self {
        let LeadDraft {
            source,
            phone_number,
            company_name,
            contact_name,
            email,
            city,
            remarks,
            disposition,
            sub_disposition,
            fields,
            created_at,
            created_by,
            sales_executive,
            sales_executive_name,
            assigned_by,
            assigned_by_name,
            assigned_at,
            follow_up_date,
        } = draft;
        Self {
            lead_id,
            profile_id: lead_id.profile_id(),
            phone_number,
            source,
            company_name,
            contact_name,
            email,
            city,
            remarks,
            disposition,
            sub_disposition,
            re_enquire: false,
            sales_executive,
            sales_executive_name,
            assigned_by,
            assigned_by_name,
            assigned_at,
            follow_up_date,
            created_at,
            created_by,
            updated_at: now,
            fields,
        }
    }

    /// Storage key of this lead.
    pub fn storage_key(&self) -> String {
        self.lead_id.storage_key()
    }

    /// Flag the lead as hot again after the prospect re-submitted an ad form.
    pub fn reopen_for_reenquiry(&mut self, now: DateTime<Utc>) {
        self.disposition = Disposition::NotOpen;
        self.sub_disposition = HOT_LEAD.to_owned();
        self.re_enquire = true;
        self.updated_at = now;
    }

    /// Hand the lead to `executive` on behalf of `actor`.
    ///
    /// Returns `true` when the hand-over changed the disposition.
    pub fn assign_to(
        &mut self,
        executive: &StaffUser,
        actor: &StaffUser,
        now: DateTime<Utc>,
    ) -> bool {
        let next = self.disposition.after_reassignment();
        let changed = next != self.disposition;
        self.disposition = next;
        self.sales_executive = Some(executive.id.clone());
        self.sales_executive_name = Some(executive.name.clone());
        self.assigned_by = Some(actor.id.clone());
        self.assigned_by_name = Some(actor.name.clone());
        self.assigned_at = Some(now);
        changed
    }

    /// Apply a caller-submitted outcome.
    pub fn record_disposition(&mut self, update: &DispositionUpdate, now: DateTime<Utc>) {
        self.disposition = update.disposition.clone();
        self.sub_disposition = update.sub_disposition.clone();
        self.follow_up_date = update.follow_up_date;
        if update.remarks.is_some() {
            self.remarks = update.remarks.clone();
        }
        self.updated_at = now;
    }

    /// Drop the executive assignment.
    pub fn clear_assignment(&mut self) {
        self.sales_executive = None;
        self.sales_executive_name = None;
    }

    /// Whether `user` is the assigned executive.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.sales_executive.as_ref() == Some(user)
    }
}
