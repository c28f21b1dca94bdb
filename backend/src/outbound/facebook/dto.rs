//! DTOs for decoding Graph API lead-ads responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into the
//! port's records in one pass.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::ports::{LeadForm, SourceField, SourceLead, SourceLeadPage};

/// Graph timestamps look like `2024-03-04T10:00:00+0000`.
const GRAPH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Rate-limit error codes documented by the Graph API.
const THROTTLING_CODES: [i64; 4] = [4, 17, 32, 613];

#[derive(Debug, Deserialize)]
pub(super) struct GraphPageDto<T> {
    #[serde(default = "Vec::new")]
    pub(super) data: Vec<T>,
    pub(super) paging: Option<PagingDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PagingDto {
    pub(super) cursors: Option<CursorsDto>,
    pub(super) next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CursorsDto {
    pub(super) after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FormDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) status: String,
    pub(super) locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LeadDto {
    pub(super) id: String,
    pub(super) created_time: String,
    #[serde(default)]
    pub(super) field_data: Vec<FieldDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FieldDto {
    pub(super) name: String,
    #[serde(default)]
    pub(super) values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphErrorEnvelopeDto {
    pub(super) error: GraphErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphErrorDto {
    #[serde(default)]
    pub(super) message: String,
    pub(super) code: Option<i64>,
}

impl GraphErrorDto {
    pub(super) fn is_throttling(&self) -> bool {
        self.code.is_some_and(|code| THROTTLING_CODES.contains(&code))
    }
}

impl<T> GraphPageDto<T> {
    /// Cursor of the next page; only present when the Graph API links one.
    fn next_cursor(&self) -> Option<String> {
        let paging = self.paging.as_ref()?;
        paging.next.as_ref()?;
        paging.cursors.as_ref()?.after.clone()
    }
}

impl GraphPageDto<FormDto> {
    pub(super) fn into_forms(self) -> Vec<LeadForm> {
        self.data
            .into_iter()
            .map(|form| LeadForm {
                id: form.id,
                name: form.name,
                status: form.status,
                locale: form.locale,
            })
            .collect()
    }
}

impl GraphPageDto<LeadDto> {
    pub(super) fn into_page(self) -> Result<SourceLeadPage, String> {
        let next_cursor = self.next_cursor();
        let leads = self
            .data
            .into_iter()
            .map(LeadDto::into_source_lead)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SourceLeadPage { leads, next_cursor })
    }
}

impl LeadDto {
    fn into_source_lead(self) -> Result<SourceLead, String> {
        let created_time = parse_graph_time(&self.created_time)
            .ok_or_else(|| format!("lead {} has unreadable created_time {}", self.id, self.created_time))?;
        Ok(SourceLead {
            id: self.id,
            created_time,
            fields: self
                .field_data
                .into_iter()
                .map(|field| SourceField {
                    name: field.name,
                    values: field.values,
                })
                .collect(),
        })
    }
}

fn parse_graph_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, GRAPH_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-03-04T10:00:00+0000")]
    #[case("2024-03-04T15:30:00+05:30")]
    fn reads_graph_and_rfc3339_timestamps(#[case] raw: &str) {
        let parsed = parse_graph_time(raw).expect("timestamp parses");
        assert_eq!(parsed.to_rfc3339(), "2024-03-04T10:00:00+00:00");
    }

    #[test]
    fn cursor_requires_a_next_link() {
        let last: GraphPageDto<LeadDto> = serde_json::from_str(
            r#"{ "data": [], "paging": { "cursors": { "before": "a", "after": "b" } } }"#,
        )
        .expect("decodes");
        assert_eq!(last.next_cursor(), None);

        let more: GraphPageDto<LeadDto> = serde_json::from_str(
            r#"{ "data": [], "paging": { "cursors": { "after": "b" }, "next": "https://x" } }"#,
        )
        .expect("decodes");
        assert_eq!(more.next_cursor().as_deref(), Some("b"));
    }
}
