//! Admin endpoints around the onboarding reminder sweep.

use std::sync::Arc;

use rocket::{Route, State};
use rocket::serde::json::Json;
use serde::Deserialize;
use ts_rs::TS;

use crate::alerts::{SweepSummary, send_manual, sweep};
use crate::auth::guards::AdminUser;
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResponse, PagedResponse};
use crate::mailer::Mailer;
use crate::models::{AlertHistoryEntry, Employee};
use crate::orm::DbConn;
use crate::orm::employee::{alert_candidates, alert_history, reset_alert};

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct SendAlertInput {
    pub recipient: Option<String>,
}

/// Runs the reminder sweep immediately instead of waiting for the daily
/// schedule. Returns the same summary the scheduled run logs.
#[post("/alerts/check-and-send")]
pub async fn check_and_send(
    db: DbConn,
    _admin: AdminUser,
    mailer: &State<Arc<dyn Mailer>>,
    config: &State<AppConfig>,
) -> Result<Json<ApiResponse<SweepSummary>>, ApiError> {
    let mailer = mailer.inner().clone();
    let config = config.inner().clone();
    let summary = db
        .run(move |conn| sweep(conn, mailer.as_ref(), &config))
        .await?;
    Ok(ApiResponse::data(summary))
}

/// Sends one reminder immediately. The optional body may carry a recipient
/// override.
#[post("/alerts/send/<id>", data = "<input>")]
pub async fn send_one(
    db: DbConn,
    _admin: AdminUser,
    mailer: &State<Arc<dyn Mailer>>,
    config: &State<AppConfig>,
    id: i32,
    input: Option<Json<SendAlertInput>>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let mailer = mailer.inner().clone();
    let config = config.inner().clone();
    let recipient = input.and_then(|i| i.into_inner().recipient);
    let employee = db
        .run(move |conn| send_manual(conn, mailer.as_ref(), &config, id, recipient.as_deref()))
        .await?;
    Ok(ApiResponse::with_message("Reminder sent", employee))
}

/// Re-arms the reminder for one employee so the next sweep picks it up.
#[post("/alerts/reset/<id>")]
pub async fn reset(
    db: DbConn,
    _admin: AdminUser,
    id: i32,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db.run(move |conn| reset_alert(conn, id)).await?;
    Ok(ApiResponse::with_message("Alert reset", employee))
}

/// Employees the next sweep would email, soonest date first.
#[get("/alerts/pending")]
pub async fn pending(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<Employee>>>, ApiError> {
    let candidates = db.run(|conn| alert_candidates(conn)).await?;
    Ok(ApiResponse::data(candidates))
}

/// Reminders already sent, most recent first, paginated.
#[get("/alerts/history?<page>&<limit>")]
pub async fn history(
    db: DbConn,
    _admin: AdminUser,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PagedResponse<AlertHistoryEntry>>, ApiError> {
    let (rows, pagination) = db
        .run(move |conn| alert_history(conn, page, limit))
        .await?;
    Ok(PagedResponse::new(rows, pagination))
}

pub fn routes() -> Vec<Route> {
    routes![check_and_send, send_one, reset, pending, history]
}
