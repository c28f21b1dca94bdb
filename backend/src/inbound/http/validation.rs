//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies arrive as loosely typed DTOs; these helpers turn their
//! fields into domain values and produce `400` errors whose `details` name
//! the offending field.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::domain::{DateRange, Error, LeadId, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidLeadId,
    InvalidUserId,
    InvalidTimestamp,
    InvalidRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidLeadId => "invalid_lead_id",
            Self::InvalidUserId => "invalid_user_id",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidRange => "invalid_range",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
    )
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_lead_id(value: &str, field: FieldName) -> Result<LeadId, Error> {
    value.parse().map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidLeadId,
            format!("{} must be a positive integer", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_lead_ids(values: &[u64], field: FieldName) -> Result<Vec<LeadId>, Error> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if *value == 0 {
                Err(Error::invalid_request(format!(
                    "{} must contain positive integers",
                    field.as_str()
                ))
                .with_details(json!({
                    "field": field.as_str(),
                    "index": index,
                    "code": ErrorCode::InvalidLeadId.as_str(),
                })))
            } else {
                Ok(LeadId::new(*value))
            }
        })
        .collect()
}

pub(crate) fn parse_user_id(value: String, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value.clone()).map_err(|err| {
        value_error(field, ErrorCode::InvalidUserId, err.to_string(), &value)
    })
}

pub(crate) fn parse_optional_user_id(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<UserId>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_user_id(raw, field))
        .transpose()
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            value_error(
                field,
                ErrorCode::InvalidTimestamp,
                format!("{} must be an RFC 3339 timestamp", field.as_str()),
                value,
            )
        })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_rfc3339_timestamp(&raw, field))
        .transpose()
}

const START_DATE: FieldName = FieldName::new("startDate");
const END_DATE: FieldName = FieldName::new("endDate");

/// Parse a window from `startDate`/`endDate`.
///
/// Two calendar dates (`YYYY-MM-DD`) select whole UTC days; anything else
/// must be a pair of RFC 3339 timestamps.
pub(crate) fn parse_date_range(
    start: Option<String>,
    end: Option<String>,
) -> Result<DateRange, Error> {
    let start = require(start, START_DATE)?;
    let end = require(end, END_DATE)?;

    let calendar = (
        NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d"),
        NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d"),
    );
    let range = match calendar {
        (Ok(first), Ok(last)) => DateRange::whole_days(first, last),
        _ => DateRange::new(
            parse_rfc3339_timestamp(start.trim(), START_DATE)?,
            parse_rfc3339_timestamp(end.trim(), END_DATE)?,
        ),
    };
    range.map_err(|err| field_error(START_DATE, ErrorCode::InvalidRange, err.message().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainErrorCode;
    use rstest::rstest;

    const LEAD_IDS: FieldName = FieldName::new("leadIds");

    fn detail<'a>(err: &'a Error, key: &str) -> Option<&'a serde_json::Value> {
        err.details().and_then(|details| details.get(key))
    }

    #[test]
    fn calendar_dates_cover_whole_days() {
        let range = parse_date_range(Some("2024-03-01".to_owned()), Some("2024-03-02".to_owned()))
            .expect("valid range");

        assert_eq!(range.start().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(
            range.end().to_rfc3339(),
            "2024-03-02T23:59:59.999999999+00:00"
        );
    }

    #[test]
    fn timestamps_are_taken_verbatim() {
        let range = parse_date_range(
            Some("2024-03-01T08:00:00+05:30".to_owned()),
            Some("2024-03-01T18:00:00Z".to_owned()),
        )
        .expect("valid range");

        assert_eq!(range.start().to_rfc3339(), "2024-03-01T02:30:00+00:00");
    }

    #[rstest]
    #[case(None, Some("2024-03-01"), "startDate", "missing_field")]
    #[case(Some("2024-03-01"), None, "endDate", "missing_field")]
    #[case(Some("yesterday"), Some("2024-03-01"), "startDate", "invalid_timestamp")]
    #[case(Some("2024-03-05"), Some("2024-03-01"), "startDate", "invalid_range")]
    fn rejects_bad_ranges(
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let err = parse_date_range(start.map(str::to_owned), end.map(str::to_owned))
            .expect_err("invalid range");

        assert_eq!(err.code(), DomainErrorCode::InvalidRequest);
        assert_eq!(detail(&err, "field").and_then(|v| v.as_str()), Some(field));
        assert_eq!(detail(&err, "code").and_then(|v| v.as_str()), Some(code));
    }

    #[test]
    fn zero_lead_id_reports_its_index() {
        let err = parse_lead_ids(&[4, 0], LEAD_IDS).expect_err("zero id");

        assert_eq!(detail(&err, "index").and_then(|v| v.as_u64()), Some(1));
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case("0", None)]
    #[case("1CD000012", None)]
    fn path_lead_ids_are_bare_integers(#[case] raw: &str, #[case] expected: Option<u64>) {
        let parsed = parse_lead_id(raw, FieldName::new("leadId")).ok().map(LeadId::get);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn blank_optional_user_id_is_absent() {
        let parsed = parse_optional_user_id(Some("  ".to_owned()), FieldName::new("salesExecutive"))
            .expect("blank is absent");
        assert!(parsed.is_none());
    }
}
