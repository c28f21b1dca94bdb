//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Staff users with their reporting line.
    staff_users (id) {
        id -> Text,
        name -> Text,
        email -> Text,
        role -> Text,
        /// One of `superAdmin`, `manager`, `teamLead`, `executive`.
        hierarchy_level -> Nullable<Text>,
        senior_id -> Nullable<Text>,
        is_active -> Bool,
    }
}

diesel::table! {
    /// Lead records. `phone_number` is unique among non-null values.
    leads (lead_id) {
        lead_id -> Int8,
        profile_id -> Text,
        phone_number -> Nullable<Text>,
        source -> Text,
        company_name -> Nullable<Text>,
        contact_name -> Nullable<Text>,
        email -> Nullable<Text>,
        city -> Nullable<Text>,
        remarks -> Nullable<Text>,
        disposition -> Text,
        sub_disposition -> Text,
        re_enquire -> Bool,
        sales_executive -> Nullable<Text>,
        sales_executive_name -> Nullable<Text>,
        assigned_by -> Nullable<Text>,
        assigned_by_name -> Nullable<Text>,
        assigned_at -> Nullable<Timestamptz>,
        follow_up_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        created_by -> Nullable<Text>,
        updated_at -> Timestamptz,
        /// Source-specific string attributes.
        fields -> Jsonb,
    }
}

diesel::table! {
    /// Append-only disposition history; `seq` preserves write order.
    lead_history (entry_id) {
        entry_id -> Uuid,
        seq -> Int8,
        lead_id -> Int8,
        updated_at -> Timestamptz,
        updated_by -> Text,
        hierarchy_level -> Nullable<Text>,
        disposition -> Text,
        sub_disposition -> Text,
        follow_up_date -> Nullable<Timestamptz>,
        remarks -> Nullable<Text>,
    }
}

diesel::table! {
    /// Named monotonic counters.
    lead_counters (name) {
        name -> Text,
        value -> Int8,
    }
}

diesel::table! {
    /// Per-source sync watermark.
    lead_sync_state (source) {
        source -> Text,
        last_fetched -> Timestamptz,
    }
}

diesel::table! {
    /// Lead-ads forms seen by the sync.
    lead_ad_forms (form_id) {
        form_id -> Text,
        name -> Text,
        status -> Text,
        locale -> Nullable<Text>,
        last_updated -> Timestamptz,
    }
}
