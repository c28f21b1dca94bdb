//! Tests for the reporting service.
//!
//! The lead store mock evaluates [`LeadQuery::matches`] over a fixed set of
//! leads so scoping rules are checked end to end.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::domain::ports::{MockLeadHistoryRepository, MockLeadRepository, MockStaffDirectory};
use crate::domain::{Disposition, ErrorCode, LeadDraft, PhoneNumber};
use crate::test_support::{caller, fixture_now, sample_org, staff, user_id};

fn days_ago(days: i64) -> DateTime<Utc> {
    fixture_now() - TimeDelta::days(days)
}

fn lead(id: u64, owner: Option<&str>, created_days_ago: i64) -> Lead {
    let draft = LeadDraft::new(LeadSource::Manual, days_ago(created_days_ago));
    let mut lead = Lead::from_draft(LeadId::new(id), draft, days_ago(created_days_ago));
    lead.sales_executive = owner.map(user_id);
    lead.sales_executive_name = owner.map(|_| "stale name".to_owned());
    lead
}

/// exec-1: 1, 5; exec-2: 2; unassigned: 3; outside the org: 4.
#[fixture]
fn leads() -> Vec<Lead> {
    vec![
        lead(1, Some("exec-1"), 5),
        lead(2, Some("exec-2"), 4),
        lead(3, None, 3),
        lead(4, Some("ghost"), 2),
        lead(5, Some("exec-1"), 1),
    ]
}

fn lead_store(leads: Vec<Lead>) -> MockLeadRepository {
    let mut store = MockLeadRepository::new();
    let for_query = leads.clone();
    store.expect_query().returning(move |query| {
        Ok(for_query
            .iter()
            .filter(|lead| query.matches(lead))
            .cloned()
            .collect())
    });
    store
        .expect_find_by_id()
        .returning(move |id| Ok(leads.iter().find(|lead| lead.lead_id == id).cloned()));
    store
}

fn directory_of(users: Vec<StaffUser>) -> MockStaffDirectory {
    let mut directory = MockStaffDirectory::new();
    directory.expect_list_all().returning(move || Ok(users.clone()));
    directory
}

fn service(
    leads: Vec<Lead>,
    history: MockLeadHistoryRepository,
) -> LeadReportingService<MockLeadRepository, MockLeadHistoryRepository, MockStaffDirectory> {
    LeadReportingService::new(
        Arc::new(lead_store(leads)),
        Arc::new(history),
        Arc::new(directory_of(sample_org())),
    )
}

fn last_month() -> DateRange {
    DateRange::new(days_ago(30), fixture_now()).expect("ordered range")
}

fn ids(leads: &[Lead]) -> Vec<u64> {
    leads.iter().map(|lead| lead.lead_id.get()).collect()
}

fn entry(lead_id: u64, by: &str, updated_days_ago: i64, follow_up: Option<i64>) -> HistoryEntry {
    HistoryEntry {
        entry_id: Uuid::new_v4(),
        lead_id: LeadId::new(lead_id),
        updated_at: days_ago(updated_days_ago),
        updated_by: user_id(by),
        hierarchy_level: None,
        disposition: Disposition::CallBack,
        sub_disposition: "NA".to_owned(),
        follow_up_date: follow_up.map(|days| fixture_now() + TimeDelta::days(days)),
        remarks: None,
    }
}

#[rstest]
#[case("exec-1", HierarchyLevel::Executive, vec![5, 1])]
#[case("mgr", HierarchyLevel::Manager, vec![3])]
#[case("lead", HierarchyLevel::TeamLead, vec![5, 2, 1])]
#[case("admin", HierarchyLevel::SuperAdmin, vec![5, 4, 3, 2, 1])]
#[tokio::test]
async fn leads_for_caller_is_scoped_by_level(
    leads: Vec<Lead>,
    #[case] who: &str,
    #[case] level: HierarchyLevel,
    #[case] expected: Vec<u64>,
) {
    let found = service(leads, MockLeadHistoryRepository::new())
        .leads_for_caller(LeadsForCallerRequest {
            caller: caller(who, level),
            range: last_month(),
        })
        .await
        .expect("query succeeds");

    assert_eq!(ids(&found), expected);
}

#[rstest]
#[tokio::test]
async fn leads_for_caller_refreshes_names_and_honours_range(leads: Vec<Lead>) {
    let range = DateRange::new(days_ago(4), days_ago(2)).expect("ordered range");

    let found = service(leads, MockLeadHistoryRepository::new())
        .leads_for_caller(LeadsForCallerRequest {
            caller: caller("admin", HierarchyLevel::SuperAdmin),
            range,
        })
        .await
        .expect("query succeeds");

    assert_eq!(ids(&found), vec![4, 3, 2]);
    let names: Vec<Option<&str>> = found
        .iter()
        .map(|lead| lead.sales_executive_name.as_deref())
        .collect();
    // Lead 4's owner left the directory, so its stored name survives.
    assert_eq!(names, vec![Some("stale name"), None, Some("Eli Exec")]);
}

#[rstest]
#[tokio::test]
async fn my_data_orders_by_disposition(mut leads: Vec<Lead>) {
    leads[0].disposition = Disposition::DealDone;
    leads[4].disposition = Disposition::CallBack;
    leads[1].disposition = Disposition::Other("Escalated".to_owned());

    let found = service(leads, MockLeadHistoryRepository::new())
        .sales_panel(SalesPanelRequest {
            caller: caller("lead", HierarchyLevel::TeamLead),
            range: last_month(),
            my_data: true,
        })
        .await
        .expect("panel succeeds");

    assert_eq!(ids(&found), vec![5, 1, 2]);
}

#[rstest]
#[tokio::test]
async fn sales_panel_merges_follow_up_and_assignment_windows(mut leads: Vec<Lead>) {
    leads[0].follow_up_date = Some(days_ago(1));
    leads[0].assigned_at = Some(days_ago(2));
    leads[0].updated_at = days_ago(1);
    leads[4].assigned_at = Some(days_ago(3));
    leads[4].updated_at = days_ago(3);
    leads[1].assigned_at = Some(days_ago(90));

    let found = service(leads, MockLeadHistoryRepository::new())
        .sales_panel(SalesPanelRequest {
            caller: caller("lead", HierarchyLevel::TeamLead),
            range: last_month(),
            my_data: false,
        })
        .await
        .expect("panel succeeds");

    assert_eq!(ids(&found), vec![1, 5]);
}

#[rstest]
#[tokio::test]
async fn dashboard_joins_history_with_resolved_names(leads: Vec<Lead>) {
    let mut history = MockLeadHistoryRepository::new();
    history
        .expect_list_for_leads()
        .withf(|ids| ids.to_vec() == vec![LeadId::new(5), LeadId::new(2), LeadId::new(1)])
        .times(1)
        .return_once(|_| {
            Ok(vec![
                entry(1, "exec-1", 4, None),
                entry(1, "departed", 2, None),
                entry(2, "lead", 3, None),
            ])
        });

    let dashboard = service(leads, history)
        .dashboard(DashboardRequest {
            caller: caller("lead", HierarchyLevel::TeamLead),
            range: last_month(),
            member_id: None,
        })
        .await
        .expect("dashboard succeeds");

    let lead_one = dashboard
        .leads
        .iter()
        .find(|row| row.lead.lead_id == LeadId::new(1))
        .expect("lead 1 present");
    let authors: Vec<&str> = lead_one
        .history
        .iter()
        .map(|entry| entry.updated_by_name.as_str())
        .collect();
    assert_eq!(authors, vec!["Unknown", "Esha Exec"]);
    let members: Vec<&str> = dashboard
        .members
        .iter()
        .map(|member| member.id.as_str())
        .collect();
    assert_eq!(members, vec!["lead", "exec-1", "exec-2"]);
}

#[rstest]
#[tokio::test]
async fn dashboard_member_filter_is_bounded_by_team(leads: Vec<Lead>) {
    let err = service(leads, MockLeadHistoryRepository::new())
        .dashboard(DashboardRequest {
            caller: caller("lead", HierarchyLevel::TeamLead),
            range: last_month(),
            member_id: Some(user_id("mgr")),
        })
        .await
        .expect_err("outside team");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn dashboard_manager_member_expands_to_subordinates(leads: Vec<Lead>) {
    let mut history = MockLeadHistoryRepository::new();
    history
        .expect_list_for_leads()
        .returning(|_| Ok(Vec::new()));

    let dashboard = service(leads, history)
        .dashboard(DashboardRequest {
            caller: caller("admin", HierarchyLevel::SuperAdmin),
            range: last_month(),
            member_id: Some(user_id("mgr")),
        })
        .await
        .expect("dashboard succeeds");

    let mut seen: Vec<u64> = dashboard
        .leads
        .iter()
        .map(|row| row.lead.lead_id.get())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 5]);
    assert!(dashboard.members.iter().all(|member| member.id.as_str() != "admin"));
    assert_eq!(dashboard.members.len(), 4);
}

#[rstest]
#[tokio::test]
async fn member_counts_group_by_owner_and_disposition(mut leads: Vec<Lead>) {
    leads[4].disposition = Disposition::Prospect;

    let counts = service(leads, MockLeadHistoryRepository::new())
        .member_lead_counts(caller("lead", HierarchyLevel::TeamLead))
        .await
        .expect("counts succeed");

    let summary: Vec<(&str, usize)> = counts
        .iter()
        .map(|row| (row.member.id.as_str(), row.total_assigned))
        .collect();
    assert_eq!(summary, vec![("lead", 0), ("exec-1", 2), ("exec-2", 1)]);
    assert_eq!(counts[1].by_disposition.get("Prospect"), Some(&1));
    assert_eq!(counts[1].by_disposition.get("NA"), Some(&1));
}

#[rstest]
#[tokio::test]
async fn allocated_leads_put_latest_assignment_first(mut leads: Vec<Lead>) {
    leads[0].assigned_at = Some(days_ago(1));
    leads[4].assigned_at = Some(days_ago(6));

    let found = service(leads, MockLeadHistoryRepository::new())
        .allocated_leads(caller("exec-1", HierarchyLevel::Executive))
        .await
        .expect("allocated succeeds");

    assert_eq!(ids(&found), vec![1, 5]);
}

#[rstest]
#[tokio::test]
async fn lead_detail_orders_history_by_follow_up(leads: Vec<Lead>) {
    let mut history = MockLeadHistoryRepository::new();
    history.expect_list_for_lead().times(1).return_once(|_| {
        Ok(vec![
            entry(1, "exec-1", 9, Some(1)),
            entry(1, "exec-1", 8, None),
            entry(1, "lead", 7, Some(5)),
        ])
    });

    let detail = service(leads, history)
        .lead_detail(caller("exec-1", HierarchyLevel::Executive), LeadId::new(1))
        .await
        .expect("detail succeeds");

    assert_eq!(detail.lead.sales_executive_name.as_deref(), Some("Esha Exec"));
    assert_eq!(detail.history[0].updated_by_name, "Tara Lead");
    assert_eq!(
        detail.last_call_back_date,
        Some(fixture_now() + TimeDelta::days(1))
    );
    assert!(detail.history[2].entry.follow_up_date.is_none());
}

#[rstest]
#[case(2, ErrorCode::Forbidden)]
#[case(99, ErrorCode::NotFound)]
#[tokio::test]
async fn executives_only_read_their_own_leads(
    leads: Vec<Lead>,
    #[case] lead_id: u64,
    #[case] expected: ErrorCode,
) {
    let mut history = MockLeadHistoryRepository::new();
    history.expect_list_for_lead().times(0);

    let err = service(leads, history)
        .lead_history(caller("exec-1", HierarchyLevel::Executive), LeadId::new(lead_id))
        .await
        .expect_err("read refused");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn lead_history_is_newest_first(leads: Vec<Lead>) {
    let mut history = MockLeadHistoryRepository::new();
    history.expect_list_for_lead().times(1).return_once(|_| {
        Ok(vec![
            entry(3, "mgr", 9, None),
            entry(3, "admin", 1, None),
            entry(3, "lead", 4, None),
        ])
    });

    let entries = service(leads, history)
        .lead_history(caller("mgr", HierarchyLevel::Manager), LeadId::new(3))
        .await
        .expect("history succeeds");

    let authors: Vec<&str> = entries
        .iter()
        .map(|entry| entry.updated_by_name.as_str())
        .collect();
    assert_eq!(authors, vec!["Asha Admin", "Tara Lead", "Manoj Manager"]);
}

#[rstest]
#[case(HierarchyLevel::Executive, 0)]
#[case(HierarchyLevel::TeamLead, 1)]
#[tokio::test]
async fn search_limits_executives_to_own_leads(
    mut leads: Vec<Lead>,
    #[case] level: HierarchyLevel,
    #[case] expected: usize,
) {
    leads[1].company_name = Some("Acme".to_owned());

    let found = service(leads, MockLeadHistoryRepository::new())
        .search(
            caller("exec-1", level),
            LeadSearch::parse("companyName", "Acme").expect("valid search"),
        )
        .await
        .expect("search succeeds");

    assert_eq!(found.len(), expected);
}

#[rstest]
#[tokio::test]
async fn hot_lead_rows_flatten_lead_ads_leads(mut leads: Vec<Lead>) {
    leads[2].source = LeadSource::Facebook;
    leads[2].phone_number = Some(PhoneNumber::new("9998887777").expect("valid phone"));
    leads[2]
        .fields
        .insert(field::AD_TYPE.to_owned(), "Spring offer".to_owned());
    leads[2]
        .fields
        .insert(field::DATA_TAG.to_owned(), "internal".to_owned());
    leads[2]
        .fields
        .insert("your_mobile_number".to_owned(), "123".to_owned());

    let rows = service(leads, MockLeadHistoryRepository::new())
        .hot_lead_rows(caller("mgr", HierarchyLevel::Manager), last_month())
        .await
        .expect("export succeeds");

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("profileId").map(String::as_str), Some("1CD000003"));
    assert_eq!(row.get("createdAt").map(String::as_str), Some("01/03/2024"));
    assert_eq!(row.get(field::AD_TYPE).map(String::as_str), Some("Spring offer"));
    assert_eq!(row.get("companyName").map(String::as_str), Some("NA"));
    assert!(!row.contains_key(field::DATA_TAG));
    assert!(!row.contains_key("your_mobile_number"));
    assert!(!row.contains_key("leadId"));
    assert!(!row.contains_key("salesExecutive"));
}

#[rstest]
#[tokio::test]
async fn executives_cannot_export(leads: Vec<Lead>) {
    let err = service(leads, MockLeadHistoryRepository::new())
        .hot_lead_rows(caller("exec-1", HierarchyLevel::Executive), last_month())
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn team_tree_surfaces_integrity_issues() {
    let mut users = sample_org();
    users.push(staff("stray", "Sam Stray", HierarchyLevel::Executive, Some("gone")));
    let service = LeadReportingService::new(
        Arc::new(MockLeadRepository::new()),
        Arc::new(MockLeadHistoryRepository::new()),
        Arc::new(directory_of(users)),
    );

    let tree = service
        .team_tree(caller("admin", HierarchyLevel::SuperAdmin))
        .await
        .expect("tree succeeds");

    assert_eq!(tree.issues.len(), 1);
    let roots: Vec<&str> = tree.roots.iter().map(|node| node.user.id.as_str()).collect();
    assert_eq!(roots, vec!["admin", "stray"]);
    assert_eq!(tree.roots[0].descendant_count(), 4);
}
