use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::request_history;

/// Append-only audit row. Never updated or deleted; one row per mutating
/// action on a request.
#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = request_history)]
#[ts(export)]
pub struct HistoryEntry {
    pub id: i32,
    pub request_id: i32,
    pub user_id: i32,
    pub action: String,
    pub prior_status: Option<String>,
    pub new_status: String,
    pub comment: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = request_history)]
pub struct NewHistoryEntry {
    pub request_id: i32,
    pub user_id: i32,
    pub action: String,
    pub prior_status: Option<String>,
    pub new_status: String,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

/// History row joined with the acting user's name and email.
#[derive(Debug, Queryable, Serialize, TS)]
#[ts(export)]
pub struct HistoryEntryWithUser {
    pub id: i32,
    pub request_id: i32,
    pub user_id: i32,
    pub action: String,
    pub prior_status: Option<String>,
    pub new_status: String,
    pub comment: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    pub user_name: String,
    pub user_email: String,
}
