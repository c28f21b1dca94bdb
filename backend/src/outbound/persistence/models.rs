//! Internal Diesel row structs and their domain conversions.
//!
//! Rows never leave the persistence layer. Conversions that can meet
//! corrupt data return `Err(String)`; repositories wrap the message in their
//! own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::LeadForm;
use crate::domain::{
    Disposition, HierarchyLevel, HistoryEntry, Lead, LeadFields, LeadId, LeadSource, PhoneNumber,
    ProfileId, StaffUser, UserId,
};

use super::schema::{lead_ad_forms, lead_history, leads, staff_users};

fn parse_user_id(raw: String, column: &str) -> Result<UserId, String> {
    UserId::new(raw).map_err(|err| format!("invalid {column}: {err}"))
}

fn parse_optional_user_id(raw: Option<String>, column: &str) -> Result<Option<UserId>, String> {
    raw.map(|value| parse_user_id(value, column)).transpose()
}

fn parse_level(raw: Option<String>) -> Result<Option<HierarchyLevel>, String> {
    raw.map(|value| {
        value
            .parse::<HierarchyLevel>()
            .map_err(|err| format!("invalid hierarchy_level: {err}"))
    })
    .transpose()
}

/// Convert a domain lead id to the `BIGINT` key.
pub(crate) fn lead_key(lead_id: LeadId) -> Result<i64, String> {
    i64::try_from(lead_id.get()).map_err(|_| format!("lead id {lead_id} exceeds BIGINT"))
}

fn lead_id_from_key(key: i64) -> Result<LeadId, String> {
    u64::try_from(key)
        .map(LeadId::new)
        .map_err(|_| format!("negative lead id {key}"))
}

/// Row of the `staff_users` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = staff_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StaffUserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub hierarchy_level: Option<String>,
    pub senior_id: Option<String>,
    pub is_active: bool,
}

impl TryFrom<StaffUserRow> for StaffUser {
    type Error = String;

    fn try_from(row: StaffUserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_user_id(row.id, "staff id")?,
            name: row.name,
            email: row.email,
            role: row.role,
            hierarchy_level: parse_level(row.hierarchy_level)?,
            senior_id: parse_optional_user_id(row.senior_id, "senior_id")?,
            is_active: row.is_active,
        })
    }
}

/// Row of the `leads` table, used for reads, inserts and full overwrites.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = leads)]
#[diesel(primary_key(lead_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LeadRow {
    pub lead_id: i64,
    pub profile_id: String,
    pub phone_number: Option<String>,
    pub source: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub remarks: Option<String>,
    pub disposition: String,
    pub sub_disposition: String,
    pub re_enquire: bool,
    pub sales_executive: Option<String>,
    pub sales_executive_name: Option<String>,
    pub assigned_by: Option<String>,
    pub assigned_by_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub fields: serde_json::Value,
}

impl TryFrom<&Lead> for LeadRow {
    type Error = String;

    fn try_from(lead: &Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            lead_id: lead_key(lead.lead_id)?,
            profile_id: lead.profile_id.as_str().to_owned(),
            phone_number: lead.phone_number.as_ref().map(|phone| phone.as_str().to_owned()),
            source: lead.source.as_str().to_owned(),
            company_name: lead.company_name.clone(),
            contact_name: lead.contact_name.clone(),
            email: lead.email.clone(),
            city: lead.city.clone(),
            remarks: lead.remarks.clone(),
            disposition: lead.disposition.label().to_owned(),
            sub_disposition: lead.sub_disposition.clone(),
            re_enquire: lead.re_enquire,
            sales_executive: lead.sales_executive.as_ref().map(|id| id.as_str().to_owned()),
            sales_executive_name: lead.sales_executive_name.clone(),
            assigned_by: lead.assigned_by.as_ref().map(|id| id.as_str().to_owned()),
            assigned_by_name: lead.assigned_by_name.clone(),
            assigned_at: lead.assigned_at,
            follow_up_date: lead.follow_up_date,
            created_at: lead.created_at,
            created_by: lead.created_by.as_ref().map(|id| id.as_str().to_owned()),
            updated_at: lead.updated_at,
            fields: serde_json::to_value(&lead.fields)
                .map_err(|err| format!("unencodable lead fields: {err}"))?,
        })
    }
}

impl TryFrom<LeadRow> for Lead {
    type Error = String;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let lead_id = lead_id_from_key(row.lead_id)?;
        let phone_number = row
            .phone_number
            .map(|raw| PhoneNumber::new(raw).map_err(|err| format!("invalid phone_number: {err}")))
            .transpose()?;
        let source = row
            .source
            .parse::<LeadSource>()
            .map_err(|err| format!("invalid source: {err}"))?;
        let fields: LeadFields = serde_json::from_value(row.fields)
            .map_err(|err| format!("invalid fields bag: {err}"))?;
        Ok(Self {
            lead_id,
            profile_id: ProfileId::from_lead_id(lead_id),
            phone_number,
            source,
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: row.email,
            city: row.city,
            remarks: row.remarks,
            disposition: Disposition::from_label(&row.disposition),
            sub_disposition: row.sub_disposition,
            re_enquire: row.re_enquire,
            sales_executive: parse_optional_user_id(row.sales_executive, "sales_executive")?,
            sales_executive_name: row.sales_executive_name,
            assigned_by: parse_optional_user_id(row.assigned_by, "assigned_by")?,
            assigned_by_name: row.assigned_by_name,
            assigned_at: row.assigned_at,
            follow_up_date: row.follow_up_date,
            created_at: row.created_at,
            created_by: parse_optional_user_id(row.created_by, "created_by")?,
            updated_at: row.updated_at,
            fields,
        })
    }
}

/// Row read from `lead_history`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lead_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HistoryRow {
    pub entry_id: Uuid,
    pub lead_id: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    pub hierarchy_level: Option<String>,
    pub disposition: String,
    pub sub_disposition: String,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = String;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entry_id: row.entry_id,
            lead_id: lead_id_from_key(row.lead_id)?,
            updated_at: row.updated_at,
            updated_by: parse_user_id(row.updated_by, "updated_by")?,
            hierarchy_level: parse_level(row.hierarchy_level)?,
            disposition: Disposition::from_label(&row.disposition),
            sub_disposition: row.sub_disposition,
            follow_up_date: row.follow_up_date,
            remarks: row.remarks,
        })
    }
}

/// Insertable history entry; `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lead_history)]
pub(crate) struct NewHistoryRow<'a> {
    pub entry_id: Uuid,
    pub lead_id: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: &'a str,
    pub hierarchy_level: Option<&'static str>,
    pub disposition: &'a str,
    pub sub_disposition: &'a str,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub remarks: Option<&'a str>,
}

impl<'a> NewHistoryRow<'a> {
    pub(crate) fn from_entry(entry: &'a HistoryEntry) -> Result<Self, String> {
        Ok(Self {
            entry_id: entry.entry_id,
            lead_id: lead_key(entry.lead_id)?,
            updated_at: entry.updated_at,
            updated_by: entry.updated_by.as_str(),
            hierarchy_level: entry.hierarchy_level.map(HierarchyLevel::as_str),
            disposition: entry.disposition.label(),
            sub_disposition: &entry.sub_disposition,
            follow_up_date: entry.follow_up_date,
            remarks: entry.remarks.as_deref(),
        })
    }
}

/// Insertable lead-ads form metadata.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lead_ad_forms)]
pub(crate) struct LeadAdFormRow<'a> {
    pub form_id: &'a str,
    pub name: &'a str,
    pub status: &'a str,
    pub locale: Option<&'a str>,
    pub last_updated: DateTime<Utc>,
}

impl<'a> LeadAdFormRow<'a> {
    pub(crate) fn new(form: &'a LeadForm, seen_at: DateTime<Utc>) -> Self {
        Self {
            form_id: &form.id,
            name: &form.name,
            status: &form.status,
            locale: form.locale.as_deref(),
            last_updated: seen_at,
        }
    }
}
