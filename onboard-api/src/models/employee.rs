use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::employees;

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = employees)]
#[ts(export)]
pub struct Employee {
    pub id: i32,
    pub full_name: String,
    pub email: String, // Will be unique
    #[ts(type = "string")]
    pub entry_date: NaiveDate,
    pub general_onboarding_complete: bool,
    pub technical_onboarding_complete: bool,
    #[ts(type = "string | null")]
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
    pub alert_sent: bool,
    #[ts(type = "string | null")]
    pub alert_sent_at: Option<NaiveDateTime>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub entry_date: NaiveDate,
    pub general_onboarding_complete: bool,
    pub technical_onboarding_complete: bool,
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
    pub alert_sent: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For API inputs and validation
#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct EmployeeInput {
    pub full_name: String,
    pub email: String,
    #[ts(type = "string")]
    pub entry_date: NaiveDate,
    #[ts(type = "string | null")]
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
}

/// Partial update payload; `None` leaves the stored value alone.
#[derive(Debug, Default, Deserialize, AsChangeset, TS)]
#[diesel(table_name = employees)]
#[ts(export)]
pub struct EmployeeUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[ts(type = "string | null")]
    pub entry_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub general_onboarding_complete: Option<bool>,
    pub technical_onboarding_complete: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub general_completed: i64,
    pub technical_completed: i64,
    pub both_completed: i64,
    pub pending: i64,
    pub upcoming_onboardings: i64,
    pub percentage_complete: i64,
}

/// Slimmed row for the technical-onboarding calendar.
#[derive(Debug, Queryable, Serialize, TS)]
#[ts(export)]
pub struct CalendarEntry {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[ts(type = "string | null")]
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    pub technical_onboarding_complete: bool,
}

/// Calendar rows grouped by ISO date string.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct CalendarData {
    pub total: i64,
    pub days: BTreeMap<String, Vec<CalendarEntry>>,
}

/// Slimmed row for the sent-alert history listing.
#[derive(Debug, Queryable, Serialize, TS)]
#[ts(export)]
pub struct AlertHistoryEntry {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[ts(type = "string | null")]
    pub technical_onboarding_date: Option<NaiveDate>,
    pub technical_onboarding_type: Option<String>,
    #[ts(type = "string | null")]
    pub alert_sent_at: Option<NaiveDateTime>,
    pub technical_onboarding_complete: bool,
}
