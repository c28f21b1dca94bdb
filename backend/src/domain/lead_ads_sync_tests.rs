//! Tests for the lead-ads sync service.

use std::sync::Arc;

use chrono::TimeDelta;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockLeadAdsSource, MockLeadIngestionCommand, MockLeadSyncStateRepository, SourceField,
    SourceLeadPage,
};
use crate::domain::{Lead, LeadId};
use crate::test_support::{MutableClock, fixture_now};

fn form(id: &str, status: &str) -> LeadForm {
    LeadForm {
        id: id.to_owned(),
        name: format!("Form {id}"),
        status: status.to_owned(),
        locale: Some("en_US".to_owned()),
    }
}

fn submission(id: &str, minutes_ago: i64, phone: &str) -> SourceLead {
    SourceLead {
        id: id.to_owned(),
        created_time: fixture_now() - TimeDelta::minutes(minutes_ago),
        fields: vec![
            SourceField {
                name: "full_name".to_owned(),
                values: vec!["Ravi Kumar".to_owned()],
            },
            SourceField {
                name: "phone_number".to_owned(),
                values: vec![phone.to_owned()],
            },
        ],
    }
}

fn page(leads: Vec<SourceLead>, next: Option<&str>) -> SourceLeadPage {
    SourceLeadPage {
        leads,
        next_cursor: next.map(str::to_owned),
    }
}

fn lead_for(draft: LeadDraft) -> Lead {
    Lead::from_draft(LeadId::new(1), draft, fixture_now())
}

fn service(
    source: MockLeadAdsSource,
    state: MockLeadSyncStateRepository,
    ingestion: MockLeadIngestionCommand,
) -> LeadAdsSyncService<MockLeadAdsSource, MockLeadSyncStateRepository, MockLeadIngestionCommand>
{
    LeadAdsSyncService::new(
        Arc::new(source),
        Arc::new(state),
        Arc::new(ingestion),
        Arc::new(MutableClock::new(fixture_now())),
    )
}

fn state_with_watermark(minutes_ago: i64) -> MockLeadSyncStateRepository {
    let mut state = MockLeadSyncStateRepository::new();
    state.expect_upsert_forms().returning(|_, _| Ok(()));
    state
        .expect_last_fetched()
        .times(1)
        .return_once(move || Ok(Some(fixture_now() - TimeDelta::minutes(minutes_ago))));
    state
        .expect_set_last_fetched()
        .withf(|at| *at == fixture_now())
        .times(1)
        .return_once(|_| Ok(()));
    state
}

#[test]
fn submission_flattens_answers_into_draft() {
    let mut raw = submission("fb-1", 5, "+91 99988 87777");
    raw.fields.push(SourceField {
        name: "preferred_days".to_owned(),
        values: vec!["Mon".to_owned(), "Tue".to_owned()],
    });
    raw.fields.push(SourceField {
        name: "notes".to_owned(),
        values: Vec::new(),
    });

    let draft = draft_from_submission(&form("f1", "ACTIVE"), raw);

    assert_eq!(draft.source, LeadSource::Facebook);
    assert_eq!(draft.contact_name.as_deref(), Some("Ravi Kumar"));
    assert_eq!(
        draft.phone_number.as_ref().map(PhoneNumber::as_str),
        Some("+919998887777")
    );
    assert_eq!(draft.fields.get("preferred_days").map(String::as_str), Some("Mon, Tue"));
    assert_eq!(draft.fields.get("notes").map(String::as_str), Some(""));
    assert_eq!(draft.fields.get(field::AD_TYPE).map(String::as_str), Some("Form f1"));
    assert_eq!(draft.fields.get(field::FACEBOOK_LEAD_ID).map(String::as_str), Some("fb-1"));
    assert!(!draft.fields.contains_key("phone_number"));
    assert!(!draft.fields.contains_key("full_name"));
}

#[test]
fn unparseable_phone_stays_in_the_bag() {
    let draft = draft_from_submission(&form("f1", "ACTIVE"), submission("fb-2", 1, "call me"));

    assert!(draft.phone_number.is_none());
    assert_eq!(draft.fields.get("phone_number").map(String::as_str), Some("call me"));
}

#[tokio::test]
async fn sync_pages_until_the_watermark_and_ingests_fresh_leads() {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .times(1)
        .return_once(|| Ok(vec![form("f1", "ACTIVE"), form("f2", "ARCHIVED")]));
    source
        .expect_fetch_leads()
        .withf(|form_id, cursor| form_id == "f1" && cursor.is_none())
        .times(1)
        .return_once(|_, _| {
            Ok(page(
                vec![submission("a", 1, "9990001111"), submission("b", 2, "9990002222")],
                Some("page-2"),
            ))
        });
    source
        .expect_fetch_leads()
        .withf(|_, cursor| cursor.as_deref() == Some("page-2"))
        .times(1)
        .return_once(|_, _| {
            Ok(page(
                vec![submission("c", 3, "9990003333"), submission("old", 90, "9990004444")],
                Some("page-3"),
            ))
        });

    let mut ingestion = MockLeadIngestionCommand::new();
    ingestion
        .expect_ingest()
        .withf(|draft| draft.source == LeadSource::Facebook)
        .times(3)
        .returning(|draft| {
            let reopened = draft.fields.get(field::FACEBOOK_LEAD_ID).map(String::as_str) == Some("b");
            let lead = lead_for(draft);
            Ok(if reopened {
                IngestOutcome::Duplicate(lead)
            } else {
                IngestOutcome::Created(lead)
            })
        });

    let report = service(source, state_with_watermark(60), ingestion)
        .sync()
        .await
        .expect("sync succeeds");

    assert_eq!(report.forms, 1);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.created, 2);
    assert_eq!(report.reopened, 1);
    assert_eq!(report.watermark, fixture_now());
}

#[tokio::test]
async fn first_run_initialises_the_watermark() {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .return_once(|| Ok(vec![form("f1", "ACTIVE")]));
    source
        .expect_fetch_leads()
        .times(1)
        .return_once(|_, _| Ok(page(vec![submission("a", 1, "9990001111")], None)));
    let mut state = MockLeadSyncStateRepository::new();
    state.expect_upsert_forms().returning(|_, _| Ok(()));
    state.expect_last_fetched().return_once(|| Ok(None));
    state
        .expect_set_last_fetched()
        .times(2)
        .returning(|_| Ok(()));
    let mut ingestion = MockLeadIngestionCommand::new();
    ingestion.expect_ingest().times(0);

    let report = service(source, state, ingestion)
        .sync()
        .await
        .expect("sync succeeds");

    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn one_failing_form_does_not_stop_the_others() {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .return_once(|| Ok(vec![form("broken", "ACTIVE"), form("ok", "ACTIVE")]));
    source
        .expect_fetch_leads()
        .withf(|form_id, _| form_id == "broken")
        .return_once(|_, _| Err(LeadAdsSourceError::rate_limited("slow down")));
    source
        .expect_fetch_leads()
        .withf(|form_id, _| form_id == "ok")
        .return_once(|_, _| Ok(page(vec![submission("a", 1, "9990001111")], None)));
    let mut ingestion = MockLeadIngestionCommand::new();
    ingestion
        .expect_ingest()
        .times(1)
        .returning(|draft| Ok(IngestOutcome::Created(lead_for(draft))));

    let report = service(source, state_with_watermark(60), ingestion)
        .sync()
        .await
        .expect("sync succeeds");

    assert_eq!(report.form_failures.len(), 1);
    assert_eq!(report.form_failures[0].form_id, "broken");
    assert_eq!(report.created, 1);
}

#[rstest]
#[case(Error::invalid_request("bad draft"), 1)]
#[case(Error::not_found("gone"), 1)]
#[tokio::test]
async fn rejected_submissions_are_counted(#[case] failure: Error, #[case] expected: usize) {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .return_once(|| Ok(vec![form("f1", "ACTIVE")]));
    source
        .expect_fetch_leads()
        .return_once(|_, _| Ok(page(vec![submission("a", 1, "9990001111")], None)));
    let mut ingestion = MockLeadIngestionCommand::new();
    ingestion
        .expect_ingest()
        .return_once(move |_| Err(failure));

    let report = service(source, state_with_watermark(60), ingestion)
        .sync()
        .await
        .expect("sync succeeds");

    assert_eq!(report.failed, expected);
}

#[tokio::test]
async fn store_outage_aborts_without_moving_the_watermark() {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .return_once(|| Ok(vec![form("f1", "ACTIVE")]));
    source
        .expect_fetch_leads()
        .return_once(|_, _| Ok(page(vec![submission("a", 1, "9990001111")], None)));
    let mut state = MockLeadSyncStateRepository::new();
    state.expect_upsert_forms().returning(|_, _| Ok(()));
    state
        .expect_last_fetched()
        .return_once(|| Ok(Some(fixture_now() - TimeDelta::hours(1))));
    state.expect_set_last_fetched().times(0);
    let mut ingestion = MockLeadIngestionCommand::new();
    ingestion
        .expect_ingest()
        .return_once(|_| Err(Error::service_unavailable("lead store unavailable")));

    let err = service(source, state, ingestion)
        .sync()
        .await
        .expect_err("outage aborts");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[case(LeadAdsSourceError::timeout("slow"), ErrorCode::ServiceUnavailable)]
#[case(LeadAdsSourceError::invalid_request("bad token"), ErrorCode::InternalError)]
#[tokio::test]
async fn form_listing_failure_aborts(#[case] failure: LeadAdsSourceError, #[case] code: ErrorCode) {
    let mut source = MockLeadAdsSource::new();
    source
        .expect_list_forms()
        .return_once(move || Err(failure));
    let mut state = MockLeadSyncStateRepository::new();
    state.expect_upsert_forms().times(0);

    let err = service(source, state, MockLeadIngestionCommand::new())
        .sync()
        .await
        .expect_err("listing failed");

    assert_eq!(err.code(), code);
}
