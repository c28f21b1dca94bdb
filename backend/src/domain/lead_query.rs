//! Store-agnostic lead filters.
//!
//! A [`LeadQuery`] is a conjunction of equality, range, and membership
//! predicates that every lead store can evaluate natively. In-memory stores
//! use [`LeadQuery::matches`]; SQL stores translate the same fields.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::error::Error;
use super::lead::{Lead, LeadId, LeadSource, PhoneNumber};
use super::user::UserId;

/// Inclusive timestamp window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Validate and construct an inclusive window.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, Error> {
        if start > end {
            return Err(Error::invalid_request("start date must not be after end date"));
        }
        Ok(Self { start, end })
    }

    /// Window spanning whole UTC days from the start of `first` to the end
    /// of `last`.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use leads_backend::domain::DateRange;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
    /// let range = DateRange::whole_days(day, day).expect("ordered range");
    /// assert_eq!(range.end().to_rfc3339(), "2024-02-29T23:59:59.999999999+00:00");
    /// ```
    pub fn whole_days(first: NaiveDate, last: NaiveDate) -> Result<Self, Error> {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - chrono::Duration::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Timestamp column a range filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadTimeField {
    CreatedAt,
    UpdatedAt,
    AssignedAt,
    FollowUpDate,
}

impl LeadTimeField {
    fn read(self, lead: &Lead) -> Option<DateTime<Utc>> {
        match self {
            Self::CreatedAt => Some(lead.created_at),
            Self::UpdatedAt => Some(lead.updated_at),
            Self::AssignedAt => lead.assigned_at,
            Self::FollowUpDate => lead.follow_up_date,
        }
    }
}

/// Constraint on the assigned executive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutiveFilter {
    #[default]
    Any,
    /// Leads nobody owns yet.
    Unassigned,
    /// Leads owned by one of these users. An empty list matches nothing.
    OneOf(Vec<UserId>),
}

/// Single-attribute lookup used by global search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadSearch {
    Phone(PhoneNumber),
    CompanyName(String),
    ProfileId(String),
    LeadId(LeadId),
}

impl LeadSearch {
    /// Build a search from a field name and user-entered value.
    pub fn parse(field: &str, value: &str) -> Result<Self, Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::invalid_request("search value must not be empty"));
        }
        match field.trim() {
            "phone_number" | "phoneNumber" | "phone" => PhoneNumber::new(value)
                .map(Self::Phone)
                .map_err(|err| Error::invalid_request(err.to_string())),
            "company_name" | "companyName" => Ok(Self::CompanyName(value.to_owned())),
            "profileId" | "profile_id" => Ok(Self::ProfileId(value.to_owned())),
            "leadId" | "lead_id" => LeadId::parse_lenient(value)
                .map(Self::LeadId)
                .map_err(|err| Error::invalid_request(err.to_string())),
            other => Err(Error::invalid_request(format!(
                "unsupported search field: {other}"
            ))),
        }
    }

    fn matches(&self, lead: &Lead) -> bool {
        match self {
            Self::Phone(phone) => lead.phone_number.as_ref() == Some(phone),
            Self::CompanyName(name) => lead.company_name.as_deref() == Some(name.as_str()),
            Self::ProfileId(profile) => lead.profile_id.as_str() == profile,
            Self::LeadId(id) => lead.lead_id == *id,
        }
    }
}

/// Conjunction of lead predicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeadQuery {
    pub window: Option<(LeadTimeField, DateRange)>,
    pub executive: ExecutiveFilter,
    pub source: Option<LeadSource>,
    pub search: Option<LeadSearch>,
}

impl LeadQuery {
    /// Query matching every lead.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn within(mut self, field: LeadTimeField, range: DateRange) -> Self {
        self.window = Some((field, range));
        self
    }

    pub fn owned_by(mut self, executives: Vec<UserId>) -> Self {
        self.executive = ExecutiveFilter::OneOf(executives);
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.executive = ExecutiveFilter::Unassigned;
        self
    }

    pub fn from_source(mut self, source: LeadSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn searching(mut self, search: LeadSearch) -> Self {
        self.search = Some(search);
        self
    }

    /// Whether this query can only return an empty result.
    pub fn is_trivially_empty(&self) -> bool {
        matches!(&self.executive, ExecutiveFilter::OneOf(ids) if ids.is_empty())
    }

    /// Evaluate the query against one lead.
    pub fn matches(&self, lead: &Lead) -> bool {
        let in_window = self.window.is_none_or(|(field, range)| {
            field.read(lead).is_some_and(|at| range.contains(at))
        });
        let owner_ok = match &self.executive {
            ExecutiveFilter::Any => true,
            ExecutiveFilter::Unassigned => lead.sales_executive.is_none(),
            ExecutiveFilter::OneOf(ids) => lead
                .sales_executive
                .as_ref()
                .is_some_and(|owner| ids.contains(owner)),
        };
        let source_ok = self.source.is_none_or(|source| lead.source == source);
        let search_ok = self.search.as_ref().is_none_or(|search| search.matches(lead));
        in_window && owner_ok && source_ok && search_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::LeadDraft;
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    fn lead(id: u64, created_day: u32, owner: Option<&str>) -> Lead {
        let created = Utc
            .with_ymd_and_hms(2024, 6, created_day, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let mut draft = LeadDraft::new(LeadSource::Manual, created);
        draft.company_name = Some("Acme".to_owned());
        draft.sales_executive = owner.map(|raw| UserId::new(raw).expect("valid id"));
        Lead::from_draft(LeadId::new(id), draft, created)
    }

    #[test]
    fn rejects_inverted_ranges() {
        assert!(DateRange::whole_days(day(5), day(4)).is_err());
    }

    #[test]
    fn whole_days_cover_both_ends() {
        let range = DateRange::whole_days(day(3), day(4)).expect("valid range");
        assert!(range.contains(lead(1, 3, None).created_at));
        assert!(range.contains(lead(1, 4, None).created_at));
        assert!(!range.contains(lead(1, 5, None).created_at));
    }

    #[test]
    fn unassigned_filter_only_matches_unowned_leads() {
        let query = LeadQuery::all().unassigned();
        assert!(query.matches(&lead(1, 1, None)));
        assert!(!query.matches(&lead(2, 1, Some("e1"))));
    }

    #[test]
    fn empty_owner_list_matches_nothing() {
        let query = LeadQuery::all().owned_by(Vec::new());
        assert!(query.is_trivially_empty());
        assert!(!query.matches(&lead(1, 1, Some("e1"))));
    }

    #[test]
    fn missing_timestamps_never_fall_in_a_window() {
        let range = DateRange::whole_days(day(1), day(30)).expect("valid range");
        let query = LeadQuery::all().within(LeadTimeField::FollowUpDate, range);
        assert!(!query.matches(&lead(1, 2, None)));
    }

    #[rstest]
    #[case("leadId", "1CD000007", LeadSearch::LeadId(LeadId::new(7)))]
    #[case("companyName", " Acme ", LeadSearch::CompanyName("Acme".to_owned()))]
    #[case("profileId", "1CD000007", LeadSearch::ProfileId("1CD000007".to_owned()))]
    fn parses_search_fields(#[case] field: &str, #[case] value: &str, #[case] expected: LeadSearch) {
        assert_eq!(LeadSearch::parse(field, value).expect("valid search"), expected);
    }

    #[test]
    fn rejects_unknown_search_fields() {
        assert!(LeadSearch::parse("city", "Pune").is_err());
    }

    #[test]
    fn search_matches_by_profile_id() {
        let query = LeadQuery::all().searching(LeadSearch::ProfileId("1CD000009".to_owned()));
        assert!(query.matches(&lead(9, 1, None)));
        assert!(!query.matches(&lead(8, 1, None)));
    }
}
