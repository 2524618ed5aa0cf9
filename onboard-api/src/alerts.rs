//! Onboarding reminder alerts.
//!
//! [`sweep`] finds employees whose technical onboarding is coming up and
//! emails a reminder for each one, latching `alert_sent` on success. A
//! liftoff fairing re-runs the sweep on a daily interval; delivery is
//! at-least-once, a send that succeeds just before a crash may repeat.

use std::sync::Arc;
use std::time::Duration;

use diesel::prelude::*;
use rocket::fairing::AdHoc;
use serde::Serialize;
use ts_rs::TS;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::mailer::{Mailer, render_onboarding_reminder};
use crate::models::Employee;
use crate::orm::DbConn;
use crate::orm::employee::{alert_candidates, get_employee, mark_alert_sent};

/// One sweep per day.
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct SweepError {
    pub employee: String,
    pub error: String,
}

/// Outcome of one sweep. `total` counts candidates, `sent + failed = total`.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct SweepSummary {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    pub errors: Vec<SweepError>,
}

fn recipient_for(employee: &Employee, config: &AppConfig) -> String {
    config
        .alert_recipient
        .clone()
        .unwrap_or_else(|| employee.email.clone())
}

/// Sends reminder emails for every due employee.
///
/// One failing send never aborts the sweep; the failure is recorded in the
/// summary and the employee stays eligible for the next run.
pub fn sweep(
    conn: &mut SqliteConnection,
    mailer: &dyn Mailer,
    config: &AppConfig,
) -> Result<SweepSummary, ApiError> {
    let candidates = alert_candidates(conn)?;

    let mut summary = SweepSummary {
        total: candidates.len() as i64,
        sent: 0,
        failed: 0,
        errors: Vec::new(),
    };

    for employee in candidates {
        let message = render_onboarding_reminder(&employee, &recipient_for(&employee, config));
        match mailer.send(&message) {
            Ok(()) => {
                mark_alert_sent(conn, employee.id)?;
                summary.sent += 1;
            }
            Err(e) => {
                warn!(
                    "[alerts] failed to send reminder for '{}': {}",
                    employee.full_name, e
                );
                summary.failed += 1;
                summary.errors.push(SweepError {
                    employee: employee.full_name,
                    error: e,
                });
            }
        }
    }

    if summary.total > 0 {
        info!(
            "[alerts] sweep done: {} candidates, {} sent, {} failed",
            summary.total, summary.sent, summary.failed
        );
    }

    Ok(summary)
}

/// Sends one reminder immediately, outside the sweep window rules.
///
/// The employee must exist, have a scheduled technical date, and not be
/// complete yet. `recipient_override` beats the configured admin address.
pub fn send_manual(
    conn: &mut SqliteConnection,
    mailer: &dyn Mailer,
    config: &AppConfig,
    employee_id: i32,
    recipient_override: Option<&str>,
) -> Result<Employee, ApiError> {
    let employee = get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    if employee.technical_onboarding_date.is_none() {
        return Err(ApiError::validation(
            "employee has no technical onboarding date scheduled",
        ));
    }
    if employee.technical_onboarding_complete {
        return Err(ApiError::validation(
            "technical onboarding is already complete",
        ));
    }

    let to = recipient_override
        .map(|s| s.to_string())
        .unwrap_or_else(|| recipient_for(&employee, config));

    let message = render_onboarding_reminder(&employee, &to);
    mailer
        .send(&message)
        .map_err(|e| ApiError::Internal(format!("failed to send reminder: {}", e)))?;

    mark_alert_sent(conn, employee.id)?;
    get_employee(conn, employee.id)?
        .ok_or_else(|| ApiError::Internal("employee vanished during send".to_string()))
}

/// Spawns the daily sweep task once the server is live.
pub fn alert_scheduler_fairing() -> AdHoc {
    AdHoc::on_liftoff("Alert Scheduler", |rocket| {
        Box::pin(async move {
            let conn = match DbConn::get_one(rocket).await {
                Some(conn) => conn,
                None => {
                    error!("[alerts] no DB connection available, scheduler disabled");
                    return;
                }
            };
            let (Some(mailer), Some(config)) = (
                rocket.state::<Arc<dyn Mailer>>().cloned(),
                rocket.state::<AppConfig>().cloned(),
            ) else {
                error!("[alerts] mailer or config not managed, scheduler disabled");
                return;
            };

            rocket::tokio::spawn(async move {
                loop {
                    rocket::tokio::time::sleep(SWEEP_INTERVAL).await;
                    let mailer = mailer.clone();
                    let config = config.clone();
                    let outcome = conn
                        .run(move |c| sweep(c, mailer.as_ref(), &config))
                        .await;
                    if let Err(e) = outcome {
                        error!("[alerts] scheduled sweep failed: {}", e);
                    }
                }
            });
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use crate::mailer::RecordingMailer;
    use crate::models::EmployeeInput;
    use crate::orm::employee::create_employee;
    use crate::orm::testing::setup_test_db;

    fn due_employee(conn: &mut SqliteConnection, name: &str, email: &str) -> Employee {
        let today = Utc::now().date_naive();
        create_employee(
            conn,
            EmployeeInput {
                full_name: name.to_string(),
                email: email.to_string(),
                entry_date: today - ChronoDuration::days(30),
                technical_onboarding_date: Some(today + ChronoDuration::days(3)),
                technical_onboarding_type: Some("Platform".to_string()),
                position: None,
                department: None,
                notes: None,
            },
        )
        .unwrap()
    }

    fn per_employee_config() -> AppConfig {
        AppConfig {
            alert_recipient: None,
            ..AppConfig::for_testing()
        }
    }

    #[test]
    fn sweep_sends_once_and_latches() {
        let mut conn = setup_test_db();
        let config = AppConfig::for_testing();
        let mailer = RecordingMailer::default();

        due_employee(&mut conn, "Ana", "ana@x.com");
        due_employee(&mut conn, "Bob", "bob@x.com");

        let summary = sweep(&mut conn, &mailer, &config).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(mailer.sent_count(), 2);
        // Configured admin address wins over the employee's own.
        assert!(
            mailer
                .sent
                .lock()
                .unwrap()
                .iter()
                .all(|m| m.to == "onboarding-admins@example.com")
        );

        let again = sweep(&mut conn, &mailer, &config).unwrap();
        assert_eq!(again.total, 0);
        assert_eq!(mailer.sent_count(), 2);
    }

    #[test]
    fn sweep_isolates_per_employee_failures() {
        let mut conn = setup_test_db();
        let config = per_employee_config();
        let mailer = RecordingMailer::default();
        mailer.fail_for.lock().unwrap().push("bob@x.com".to_string());

        due_employee(&mut conn, "Ana", "ana@x.com");
        let bob = due_employee(&mut conn, "Bob", "bob@x.com");

        let summary = sweep(&mut conn, &mailer, &config).unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].employee, "Bob");

        // The failed employee stays eligible; the sent one is latched.
        let bob = get_employee(&mut conn, bob.id).unwrap().unwrap();
        assert!(!bob.alert_sent);
        let retry = sweep(&mut conn, &mailer, &config).unwrap();
        assert_eq!(retry.total, 1);
        assert_eq!(retry.failed, 1);
    }

    #[test]
    fn manual_send_validates_and_honors_override() {
        let mut conn = setup_test_db();
        let config = per_employee_config();
        let mailer = RecordingMailer::default();

        assert!(matches!(
            send_manual(&mut conn, &mailer, &config, 9999, None),
            Err(ApiError::NotFound(_))
        ));

        let today = Utc::now().date_naive();
        let unscheduled = create_employee(
            &mut conn,
            EmployeeInput {
                full_name: "No Date".to_string(),
                email: "nodate@x.com".to_string(),
                entry_date: today,
                technical_onboarding_date: None,
                technical_onboarding_type: None,
                position: None,
                department: None,
                notes: None,
            },
        )
        .unwrap();
        assert!(matches!(
            send_manual(&mut conn, &mailer, &config, unscheduled.id, None),
            Err(ApiError::Validation(_))
        ));

        let due = due_employee(&mut conn, "Ana", "ana@x.com");
        let sent = send_manual(&mut conn, &mailer, &config, due.id, Some("lead@x.com"))
            .unwrap();
        assert!(sent.alert_sent);
        assert!(sent.alert_sent_at.is_some());
        assert_eq!(mailer.sent.lock().unwrap()[0].to, "lead@x.com");

        // Already complete is rejected too.
        let done = crate::orm::employee::complete_technical(&mut conn, due.id).unwrap();
        assert!(matches!(
            send_manual(&mut conn, &mailer, &config, done.id, None),
            Err(ApiError::Validation(_))
        ));
    }
}
