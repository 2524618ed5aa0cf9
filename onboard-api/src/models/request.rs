use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::PublicUser;
use crate::schema::requests;

/// Approval-request lifecycle states.
///
/// The transition table is the single source of truth: `pending` may move to
/// either terminal state, terminal states accept nothing. Stored as lowercase
/// text in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<RequestStatus> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
        )
    }
}

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = requests)]
#[ts(export)]
pub struct Request {
    pub id: i32,
    pub code: String, // Display id, e.g. REQ-MDQ3X2K1-7B4A
    pub title: String,
    pub description: String,
    pub request_type_id: i32,
    pub requester_id: i32,
    pub responsible_id: i32,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl Request {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::parse(&self.status).unwrap_or(RequestStatus::Pending)
    }
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = requests)]
pub struct NewRequest {
    pub code: String,
    pub title: String,
    pub description: String,
    pub request_type_id: i32,
    pub requester_id: i32,
    pub responsible_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For API inputs and validation
#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct RequestInput {
    pub title: String,
    pub description: String,
    pub request_type_id: i32,
    pub responsible_id: i32,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct RequestUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub request_type_id: Option<i32>,
    pub responsible_id: Option<i32>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct StatusChangeInput {
    pub status: RequestStatus,
    pub comment: Option<String>,
}

/// Request joined with its type name and both user projections.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: Request,
    pub type_name: String,
    pub requester: PublicUser,
    pub responsible: PublicUser,
}

/// Detail plus the full audit trail, newest entry first.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RequestWithHistory {
    #[serde(flatten)]
    pub detail: RequestDetail,
    pub history: Vec<crate::models::HistoryEntryWithUser>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RequestStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reaches_both_terminal_states() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for from in [RequestStatus::Approved, RequestStatus::Rejected] {
            for to in [
                RequestStatus::Pending,
                RequestStatus::Approved,
                RequestStatus::Rejected,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("cancelled"), None);
    }
}
