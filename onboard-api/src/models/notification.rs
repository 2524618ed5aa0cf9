use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::notifications;

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = notifications)]
#[ts(export)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub request_id: Option<i32>,
    pub kind: String,
    pub message: String,
    pub read: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: i32,
    pub request_id: Option<i32>,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

/// Notification joined with minimal context from the linked request,
/// when there is one.
#[derive(Debug, Queryable, Serialize, TS)]
#[ts(export)]
pub struct NotificationWithRequest {
    pub id: i32,
    pub user_id: i32,
    pub request_id: Option<i32>,
    pub kind: String,
    pub message: String,
    pub read: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    pub request_code: Option<String>,
    pub request_title: Option<String>,
    pub request_status: Option<String>,
}
